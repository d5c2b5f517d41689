pub mod id;
pub mod numeric;
pub mod search;
pub mod types;

pub use id::create_id;
pub use numeric::{Extrema, index10, log10, max_min, nice, precision_of, round};
pub use search::{nearest_index, nearest_index_by};
pub use types::{LogicalSize, PhysicalSize, SurfaceGeometry};
