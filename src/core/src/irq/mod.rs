//! External interrupt dispatch.

mod dispatch;

pub use dispatch::{Handler, IrqDispatch};
