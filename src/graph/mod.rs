mod graph;

pub use graph::DiscretizedGraph;
