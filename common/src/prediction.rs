//! 病害判定フロー
//!
//! empty → image-selected → previewed → predicting → predicted
//! 失敗時は previewed に戻る。
//! 判定結果は推奨フォームの病害欄の既定値としても使われる。

use crate::types::{ImageMeta, Prediction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PredictionState {
    #[default]
    Empty,
    ImageSelected,
    Previewed,
    Predicting,
    Predicted,
}

/// キャンバス上の描画矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 縦横比を保ったまま中央に収める（レターボックス）
pub fn fit_rect(canvas_width: f64, canvas_height: f64, image_width: f64, image_height: f64) -> Rect {
    if image_width <= 0.0 || image_height <= 0.0 {
        return Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }
    let ratio = (canvas_width / image_width).min(canvas_height / image_height);
    let width = image_width * ratio;
    let height = image_height * ratio;
    Rect {
        x: (canvas_width - width) / 2.0,
        y: (canvas_height - height) / 2.0,
        width,
        height,
    }
}

/// 確率の降順に並んでいるか
///
/// 並び順は判定APIの契約。クライアント側で並べ替えはしない。
pub fn is_ranked(predictions: &[Prediction]) -> bool {
    predictions.windows(2).all(|w| w[0].prob >= w[1].prob)
}

#[derive(Debug, Clone, Default)]
pub struct PredictionFlow {
    state: PredictionState,
    image: Option<ImageMeta>,
    predictions: Vec<Prediction>,
    /// 画像選択ごとに進む世代。古い描画完了通知を無視するのに使う
    generation: u32,
}

impl PredictionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PredictionState {
        self.state
    }

    /// 選択中の画像
    pub fn image(&self) -> Option<&ImageMeta> {
        self.image.as_ref()
    }

    /// 直近の判定結果
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// ドロップ・ファイル選択・カメラ撮影で画像を選んだ
    ///
    /// 返した世代を描画完了・失敗の通知に渡す。
    pub fn select_image(&mut self, image: ImageMeta) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.image = Some(image);
        self.state = PredictionState::ImageSelected;
        self.generation
    }

    /// キャンバスへの描画が終わった（後から別の画像が選ばれていれば無視）
    pub fn mark_previewed(&mut self, generation: u32) {
        if generation == self.generation && self.state == PredictionState::ImageSelected {
            self.state = PredictionState::Previewed;
        }
    }

    /// 画像を描画できなかった。選択を取り消して empty に戻す
    pub fn preview_failed(&mut self, generation: u32) {
        if generation == self.generation {
            self.image = None;
            self.state = PredictionState::Empty;
        }
    }

    /// 判定を開始できれば predicting に遷移して true
    ///
    /// キャンバスが選択中の画像を描き終えている状態からのみ開始できる。
    /// 判定中の再要求は重ねて送る。
    pub fn begin_predict(&mut self) -> bool {
        if !matches!(
            self.state,
            PredictionState::Previewed | PredictionState::Predicting | PredictionState::Predicted
        ) {
            return false;
        }
        self.state = PredictionState::Predicting;
        true
    }

    /// 判定結果を受け取り、最上位のラベルを返す
    ///
    /// 判定中に別の画像が選ばれていたら結果は捨てる。
    pub fn finish(&mut self, predictions: Vec<Prediction>) -> Option<String> {
        if !matches!(
            self.state,
            PredictionState::Predicting | PredictionState::Predicted
        ) {
            return None;
        }
        self.predictions = predictions;
        self.state = PredictionState::Predicted;
        self.top().map(|p| p.label.clone())
    }

    pub fn fail(&mut self) {
        if self.state != PredictionState::Predicting {
            return;
        }
        self.state = if self.image.is_some() {
            PredictionState::Previewed
        } else {
            PredictionState::Empty
        };
    }

    /// 結果カードを選んだときに病害欄へ入れるラベル
    pub fn select(&self, index: usize) -> Option<String> {
        self.predictions.get(index).map(|p| p.label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds() -> Vec<Prediction> {
        vec![
            Prediction {
                label: "blight".into(),
                prob: 0.82,
            },
            Prediction {
                label: "rust".into(),
                prob: 0.10,
            },
        ]
    }

    fn image() -> ImageMeta {
        ImageMeta {
            name: "leaf.heic".into(),
            size: 4096,
        }
    }

    #[test]
    fn test_fit_rect_landscape() {
        let r = fit_rect(512.0, 512.0, 1024.0, 512.0);
        assert_eq!(r.width, 512.0);
        assert_eq!(r.height, 256.0);
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 128.0);
    }

    #[test]
    fn test_fit_rect_portrait_upscale() {
        let r = fit_rect(400.0, 300.0, 100.0, 200.0);
        assert_eq!(r.width, 150.0);
        assert_eq!(r.height, 300.0);
        assert_eq!(r.x, 125.0);
        assert_eq!(r.y, 0.0);
    }

    #[test]
    fn test_fit_rect_empty_image() {
        let r = fit_rect(400.0, 300.0, 0.0, 200.0);
        assert_eq!(r.width, 0.0);
    }

    #[test]
    fn test_is_ranked() {
        assert!(is_ranked(&preds()));
        assert!(is_ranked(&[]));
        let mut reversed = preds();
        reversed.reverse();
        assert!(!is_ranked(&reversed));
    }

    #[test]
    fn test_predict_requires_image() {
        let mut flow = PredictionFlow::new();
        assert!(!flow.begin_predict());
        assert_eq!(flow.state(), PredictionState::Empty);
    }

    #[test]
    fn test_full_flow() {
        let mut flow = PredictionFlow::new();
        let generation = flow.select_image(image());
        assert_eq!(flow.state(), PredictionState::ImageSelected);
        flow.mark_previewed(generation);
        assert_eq!(flow.state(), PredictionState::Previewed);
        assert!(flow.begin_predict());
        assert_eq!(flow.state(), PredictionState::Predicting);

        let top = flow.finish(preds());
        assert_eq!(top.as_deref(), Some("blight"));
        assert_eq!(flow.state(), PredictionState::Predicted);
        assert_eq!(flow.select(1).as_deref(), Some("rust"));
        assert_eq!(flow.select(5), None);

        // 同じ画像で再判定できる
        assert!(flow.begin_predict());
    }

    #[test]
    fn test_predict_waits_for_new_image_preview() {
        let mut flow = PredictionFlow::new();
        let first = flow.select_image(image());
        flow.mark_previewed(first);

        flow.select_image(ImageMeta {
            name: "next.heic".into(),
            size: 10,
        });
        assert!(!flow.begin_predict());
        assert_eq!(flow.state(), PredictionState::ImageSelected);

        // 前の画像の描画完了が遅れて届いても previewed にしない
        flow.mark_previewed(first);
        assert_eq!(flow.state(), PredictionState::ImageSelected);
        assert!(!flow.begin_predict());
    }

    #[test]
    fn test_result_for_replaced_image_is_dropped() {
        let mut flow = PredictionFlow::new();
        let first = flow.select_image(image());
        flow.mark_previewed(first);
        assert!(flow.begin_predict());

        flow.select_image(ImageMeta {
            name: "other.png".into(),
            size: 1,
        });
        assert_eq!(flow.finish(preds()), None);
        assert!(flow.predictions().is_empty());
        assert_eq!(flow.state(), PredictionState::ImageSelected);
    }

    #[test]
    fn test_preview_failure_resets_selection() {
        let mut flow = PredictionFlow::new();
        let first = flow.select_image(image());
        flow.mark_previewed(first);
        let second = flow.select_image(image());

        flow.preview_failed(first);
        assert_eq!(flow.state(), PredictionState::ImageSelected);

        flow.preview_failed(second);
        assert_eq!(flow.state(), PredictionState::Empty);
        assert!(flow.image().is_none());
        assert!(!flow.begin_predict());
    }

    #[test]
    fn test_failure_returns_to_previewed() {
        let mut flow = PredictionFlow::new();
        let generation = flow.select_image(image());
        flow.mark_previewed(generation);
        assert!(flow.begin_predict());
        flow.fail();
        assert_eq!(flow.state(), PredictionState::Previewed);
        assert!(flow.predictions().is_empty());
    }

    #[test]
    fn test_empty_result_has_no_top() {
        let mut flow = PredictionFlow::new();
        let generation = flow.select_image(image());
        flow.mark_previewed(generation);
        assert!(flow.begin_predict());
        assert_eq!(flow.finish(vec![]), None);
    }
}
