//! Built-in fixers

mod catching;
mod throwing;
mod types;

pub use catching::{RemoveCatchVariable, RethrowThreadAbort};
pub use throwing::BareRethrow;
pub use types::{AddStandardConstructors, MakePublic};

use crate::fixer::Fixer;

pub fn all() -> Vec<Box<dyn Fixer>> {
    vec![
        Box::new(BareRethrow),
        Box::new(RethrowThreadAbort),
        Box::new(AddStandardConstructors),
        Box::new(MakePublic),
        Box::new(RemoveCatchVariable),
    ]
}
