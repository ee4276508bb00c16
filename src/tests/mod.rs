mod pipeline_tests;
mod resources;
mod support;
