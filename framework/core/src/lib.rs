mod errors;
mod interrupt;
mod player;

pub mod prelude {
    pub use crate::errors::{InterruptedError, ProcessTimeoutError};
    pub use crate::interrupt::{InterruptHandle, InterruptListener};
    pub use crate::player::PlayerColor;
}
