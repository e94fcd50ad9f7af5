#![feature(portable_simd)]

pub mod alignment;
pub mod data;
pub mod graph;

pub use crate::{
    alignment::{AlignError, Alignment, Direction, HMatrix, LaneWidth, Profile, ScoreSize, Seed},
    data::{Cigar, CigarOp, CigarRun, NT_TABLE, ScoringMatrix},
    graph::{Graph, Node},
};
