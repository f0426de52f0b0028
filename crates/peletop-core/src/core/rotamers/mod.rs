pub mod graph;
pub mod library;

pub use graph::{DisconnectedMoleculeError, RotamerGraph};
pub use library::{Branch, InvalidResolutionError, Rotamer, RotamerLibrary};
