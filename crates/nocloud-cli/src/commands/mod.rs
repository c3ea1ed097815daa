pub mod audit;
pub mod crypt;
pub mod misc;
pub mod password;
pub mod remote;
pub mod rename;
