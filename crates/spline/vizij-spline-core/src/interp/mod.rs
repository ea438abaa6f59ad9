//! Interpolation primitives used by the evaluator.

pub mod functions;

pub use functions::{
    catmull_rom, catmull_rom_terms, quat_exp, quat_ln, slerp, squad, squad_intermediate,
    CatmullRomTerms,
};
