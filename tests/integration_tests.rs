// Gateway file to expose integration tests from the integration/ subdirectory
// Each test file in integration/ needs to be included here

#[path = "common/mod.rs"]
mod common;

#[path = "integration/test_pipeline_end_to_end.rs"]
mod test_pipeline_end_to_end;

#[path = "integration/test_graph_from_embeddings.rs"]
mod test_graph_from_embeddings;

#[path = "integration/test_config_layers.rs"]
mod test_config_layers;

#[path = "integration/test_graph_properties.rs"]
mod test_graph_properties;
