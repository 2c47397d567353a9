pub mod binding;
pub mod controller;
pub mod load_watch;
pub mod palette;
pub mod selection;
pub mod surface;

pub use binding::*;
pub use controller::*;
pub use load_watch::*;
pub use palette::*;
pub use selection::*;
pub use surface::*;
