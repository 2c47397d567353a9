pub mod layer;
pub mod legend;
pub mod raster;
pub mod registry;
pub mod symbology;

pub use layer::*;
pub use legend::*;
pub use raster::*;
pub use registry::*;
pub use symbology::*;
