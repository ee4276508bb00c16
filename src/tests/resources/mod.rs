mod cluster_tests;
mod guest_tests;
mod node_tests;
