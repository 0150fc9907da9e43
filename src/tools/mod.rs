//! This module gathers small utilities shared by the network model,
//! the mde solver and the knn builder.

pub mod dist;

pub mod edge;

pub mod topk;
