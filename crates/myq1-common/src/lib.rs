// myq1-common — types and math shared by the renderer crates

pub mod bspfile;
pub mod q_shared;
