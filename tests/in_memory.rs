//! In-memory integration tests for the dispatch flow, wired from the
//! fixture configuration.

mod test_helpers;

mod in_memory {
    mod config_loading_tests;
    mod dispatch_flow_tests;
    mod reference_swap_tests;
}
