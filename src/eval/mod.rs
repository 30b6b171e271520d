//! Evaluation engine: labelled cases, dataset integrity, scoring and gating.
//!
//! Data flows one way: [`case`] specs become a [`ground_truth::Dataset`]
//! once [`integrity`] passes; [`report`] turns a JUnit file into run records;
//! [`score`] counts them per [`metric`]; [`gate`] turns the score into a
//! pipeline decision. [`runner`] and [`surface`] sit beside that flow: the
//! first produces run records from an agent, the second audits what the
//! agent is able to do.

pub mod case;
pub mod gate;
pub mod ground_truth;
pub mod integrity;
pub mod metric;
pub mod report;
pub mod runner;
pub mod score;
pub mod surface;
