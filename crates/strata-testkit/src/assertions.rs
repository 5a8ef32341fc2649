//! Assertion helpers for dispatch tests

/// Assert that a result is an error of the given `StrataError` variant
#[macro_export]
macro_rules! assert_strata_err {
    ($result:expr, $variant:ident) => {
        match $result {
            Err($crate::strata_core::StrataError::$variant { .. }) => {}
            other => panic!(
                "Expected StrataError::{}, got {:?}",
                stringify!($variant),
                other
            ),
        }
    };
}

/// Assert the bottom-to-top layer labels of an object
#[macro_export]
macro_rules! assert_layer_labels {
    ($object:expr, [$($label:expr),* $(,)?]) => {{
        let mut labels: Vec<String> = Vec::new();
        $object.each_layer(|layer| {
            labels.push(layer.label().unwrap_or("<anonymous>").to_owned());
        });
        let expected: Vec<String> = vec![$($label.to_string()),*];
        assert_eq!(labels, expected, "Unexpected layer order (bottom to top)");
    }};
}
