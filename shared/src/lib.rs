pub mod params;
pub mod signature;
pub mod token;
