pub mod oil_price;
pub mod response;

pub use oil_price::*;
pub use response::*;
