//! 価格表の編集モデル
//!
//! 価格エントリの正はリモートAPI。ここでは表の各行の編集中コピーを持つ。
//! 行ごとに独立して保存・削除し、複数行をまとめたトランザクションは無い。

use crate::types::PriceEntry;

/// 表の列（表示順）
pub const PRICE_FIELDS: [&str; 10] = [
    "district",
    "dealer",
    "product_name",
    "brand",
    "crop",
    "disease",
    "unit_price_inr",
    "unit",
    "expected_yield_gain_pct",
    "notes",
];

/// 保存時のリクエスト種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// POST /prices
    Create,
    /// PUT /prices/{id}
    Update(i64),
}

/// 削除時の動作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// 未作成の行は画面から消すだけ
    LocalOnly,
    /// DELETE /prices/{id}
    Remote(i64),
}

/// 自由入力の数値欄を読む
///
/// 先頭から読める最長の数値を使う（`"12kg"` は 12）。読めなければ0。
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim();
    text.get(..numeric_prefix_len(text))
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// `[+-]digits[.digits][e[+-]digits]` に一致する先頭部分の長さ
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        mantissa_end = digits_from(int_end + 1);
    }
    // 数字が1つも無ければ数値ではない
    if mantissa_end - end <= usize::from(mantissa_end > int_end) {
        return 0;
    }

    end = mantissa_end;
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}

fn format_amount(value: f64) -> String {
    format!("{}", value)
}

/// 表の1行（編集中の文字列）
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    /// 画面上の行キー（リモートIDとは別）
    pub key: u64,
    pub id: Option<i64>,
    cells: Vec<String>,
}

impl PriceRow {
    pub fn from_entry(key: u64, entry: &PriceEntry) -> Self {
        let cells = PRICE_FIELDS
            .iter()
            .map(|field| match *field {
                "district" => entry.district.clone(),
                "dealer" => entry.dealer.clone(),
                "product_name" => entry.product_name.clone(),
                "brand" => entry.brand.clone(),
                "crop" => entry.crop.clone(),
                "disease" => entry.disease.clone(),
                "unit_price_inr" => format_amount(entry.unit_price_inr),
                "unit" => entry.unit.clone(),
                "expected_yield_gain_pct" => format_amount(entry.expected_yield_gain_pct),
                _ => entry.notes.clone(),
            })
            .collect();
        Self {
            key,
            id: entry.id,
            cells,
        }
    }

    /// 空の新規行
    pub fn blank(key: u64) -> Self {
        Self {
            key,
            id: None,
            cells: vec![String::new(); PRICE_FIELDS.len()],
        }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, field: &str) -> Option<&str> {
        let idx = PRICE_FIELDS.iter().position(|f| *f == field)?;
        self.cells.get(idx).map(String::as_str)
    }

    pub fn set_cell(&mut self, index: usize, value: String) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = value;
        }
    }

    /// 送信用のエントリ（全項目、数値は読めなければ0）
    pub fn to_payload(&self) -> PriceEntry {
        let text = |field: &str| self.cell(field).unwrap_or_default().trim().to_string();
        PriceEntry {
            id: self.id,
            district: text("district"),
            dealer: text("dealer"),
            product_name: text("product_name"),
            brand: text("brand"),
            crop: text("crop"),
            disease: text("disease"),
            unit_price_inr: parse_amount(&text("unit_price_inr")),
            unit: text("unit"),
            expected_yield_gain_pct: parse_amount(&text("expected_yield_gain_pct")),
            notes: text("notes"),
        }
    }

    pub fn save_target(&self) -> SaveTarget {
        match self.id {
            Some(id) => SaveTarget::Update(id),
            None => SaveTarget::Create,
        }
    }

    pub fn delete_target(&self) -> DeleteTarget {
        match self.id {
            Some(id) => DeleteTarget::Remote(id),
            None => DeleteTarget::LocalOnly,
        }
    }
}

/// 表全体
///
/// 再読み込みは常に全件を取り直して描き直す。差分キャッシュは持たない。
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    rows: Vec<PriceRow>,
    next_key: u64,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    fn take_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }

    /// 取得した全件で置き換える
    pub fn replace_all(&mut self, entries: &[PriceEntry]) {
        self.rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = self.take_key();
            self.rows.push(PriceRow::from_entry(key, entry));
        }
    }

    /// 空行を先頭に追加し、その行キーを返す
    pub fn add_row(&mut self) -> u64 {
        let key = self.take_key();
        self.rows.insert(0, PriceRow::blank(key));
        key
    }

    pub fn row(&self, key: u64) -> Option<&PriceRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn edit(&mut self, key: u64, index: usize, value: String) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.key == key) {
            row.set_cell(index, value);
        }
    }

    pub fn remove(&mut self, key: u64) {
        self.rows.retain(|r| r.key != key);
    }
}
