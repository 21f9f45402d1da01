//! Domain types shared by the API server and the CLI.

pub mod email;
pub mod id;
pub mod password;
pub mod price;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{MIN_PASSWORD_LENGTH, PasswordError, check_password_strength};
pub use price::{
    MONEY_LIMIT, MONEY_SCALE, PriceError, cart_total, line_subtotal, normalize_price, round_money,
};
pub use quantity::{Quantity, QuantityError};
pub use status::*;
