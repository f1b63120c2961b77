mod support;

mod connector_tests;
