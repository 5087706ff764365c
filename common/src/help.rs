//! 入力欄の説明（infoアイコンから開くダイアログの文面）

/// ダイアログに出す見出しと本文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHelp {
    pub title: &'static str,
    pub body: &'static str,
}

const HELP: &[(&str, FieldHelp)] = &[
    (
        "district",
        FieldHelp {
            title: "District",
            body: "Your district. Dealer prices are matched against it.",
        },
    ),
    (
        "crop",
        FieldHelp {
            title: "Crop",
            body: "The crop in the photo, e.g. Tomato or Potato.",
        },
    ),
    (
        "disease",
        FieldHelp {
            title: "Disease",
            body: "Filled from the diagnosis. You can pick another label from the list.",
        },
    ),
    (
        "baseline_price_per_kg",
        FieldHelp {
            title: "Baseline price",
            body: "Expected selling price of your produce in rupees per kg.",
        },
    ),
    (
        "acreage",
        FieldHelp {
            title: "Acreage",
            body: "Area to be treated, in acres. Decimals are allowed.",
        },
    ),
    (
        "unit_price_inr",
        FieldHelp {
            title: "Unit price",
            body: "Dealer price in rupees for one unit of the product.",
        },
    ),
    (
        "unit",
        FieldHelp {
            title: "Unit",
            body: "Pack size the unit price refers to, e.g. kg or litre.",
        },
    ),
    (
        "expected_yield_gain_pct",
        FieldHelp {
            title: "Yield gain",
            body: "Expected yield increase in percent when the product is applied.",
        },
    ),
];

/// フィールド名に対応する説明
pub fn field_help(field: &str) -> Option<FieldHelp> {
    HELP.iter().find(|(name, _)| *name == field).map(|(_, help)| *help)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PRICE_FIELDS;

    #[test]
    fn test_form_fields_have_help() {
        for field in ["district", "crop", "disease", "baseline_price_per_kg", "acreage"] {
            let help = field_help(field).expect("説明が無い");
            assert!(!help.title.is_empty());
            assert!(!help.body.is_empty());
        }
    }

    #[test]
    fn test_numeric_price_columns_have_help() {
        for field in ["unit_price_inr", "expected_yield_gain_pct"] {
            assert!(PRICE_FIELDS.contains(&field));
            assert!(field_help(field).is_some());
        }
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(field_help("notes"), None);
    }
}
