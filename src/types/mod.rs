pub mod login;
pub mod timezone;
pub use login::*;
pub use timezone::*;
