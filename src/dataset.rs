//! Sample spreadsheet data shipped with the exporter.

use lazy_static::lazy_static;
use serde_json::{Value, json};

lazy_static! {
    static ref SAMPLE_DATASET: Value = json!([
        { "cell": "a1", "value": "Country" },
        { "cell": "b1", "value": "Product" },
        { "cell": "c1", "value": "Price" },
        { "cell": "d1", "value": "Amount" },
        { "cell": "e1", "value": "Total Price" },

        { "cell": "a2", "value": "Ecuador" },
        { "cell": "b2", "value": "Banana" },
        { "cell": "c2", "value": 6.68, "css": "someclass" },
        { "cell": "d2", "value": 430 },
        { "cell": "e2", "value": 2872.4 },

        { "cell": "a3", "value": "Belarus" },
        { "cell": "b3", "value": "Apple" },
        { "cell": "c3", "value": 3.75, "css": "someclass" },
        { "cell": "d3", "value": 600 },
        { "cell": "e3", "value": 2250 },

        { "cell": "a4", "value": "Peru" },
        { "cell": "b4", "value": "Grapes" },
        { "cell": "c4", "value": 7.69 },
        { "cell": "d4", "value": 740 },
        { "cell": "e4", "value": 5690.6 },

        { "cell": "a5", "value": "Egypt" },
        { "cell": "b5", "value": "Orange" },
        { "cell": "c5", "value": 5.86 },
        { "cell": "d5", "value": 560 },
        { "cell": "e5", "value": 3281.6 },

        { "cell": "a6", "value": "South Africa" },
        { "cell": "b6", "value": "Grapefruit" },
        { "cell": "c6", "value": 8.58 },
        { "cell": "d6", "value": 800 },
        { "cell": "e6", "value": 6864 },

        { "cell": "a7", "value": "Spain" },
        { "cell": "b7", "value": "Lemon" },
        { "cell": "c7", "value": 9.12 },
        { "cell": "d7", "value": 650 },
        { "cell": "e7", "value": 5928 },

        { "cell": "a8", "value": "Iran" },
        { "cell": "b8", "value": "Pomegranate" },
        { "cell": "c8", "value": 9.67 },
        { "cell": "d8", "value": 300 },
        { "cell": "e8", "value": 2901 }
    ]);
    static ref STYLED_DATASET: Value = json!({
        "data": SAMPLE_DATASET.clone(),
        "styles": {
            "someclass": {
                "background": "#F2F2F2",
                "color": "#F57C00"
            }
        }
    });
}

/// Plain cell list, 5 columns by 8 rows.
pub fn sample_dataset() -> Value {
    SAMPLE_DATASET.clone()
}

/// The sample cells together with the `someclass` style they reference.
pub fn styled_dataset() -> Value {
    STYLED_DATASET.clone()
}
