pub mod cigar;
pub mod matrices;
pub mod seq;

pub use cigar::{Cigar, CigarOp, CigarRun};
pub use matrices::ScoringMatrix;
pub use seq::{NT_TABLE, encode_with, reversed_prefix};
