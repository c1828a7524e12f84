pub mod rankings;
pub mod run;
pub mod seed;
pub mod serve;
