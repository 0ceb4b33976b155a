pub mod enumerator;
pub mod generator;
pub mod materialize;
pub mod path;

pub use enumerator::{EnumerationStats, Enumerator};
pub use generator::ShortestPathsGenerator;
pub use materialize::MaterializedPath;
pub use path::{Path, PathTable};
