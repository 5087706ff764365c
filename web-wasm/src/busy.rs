//! 処理中表示のスコープ管理

use leptos::prelude::*;

/// 画面ごとの処理中カウンタ
///
/// 重なったリクエストがすべて終わるまで処理中のまま。
#[derive(Clone, Copy)]
pub struct Busy {
    count: RwSignal<u32>,
}

impl Busy {
    pub fn new() -> Self {
        Self {
            count: RwSignal::new(0),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.count.get() > 0
    }

    /// 処理を1件始める。ガードの破棄で終わる
    pub fn acquire(&self) -> BusyGuard {
        self.count.update(|n| *n += 1);
        BusyGuard { count: self.count }
    }
}

impl Default for Busy {
    fn default() -> Self {
        Self::new()
    }
}

/// 生存中は処理中に数え、破棄時に必ず外す
///
/// `?` による早期リターンやエラー経路でも表示が残らない。
pub struct BusyGuard {
    count: RwSignal<u32>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        // コンポーネント破棄後のシグナルには書き込まない
        let _ = self.count.try_update(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use kisan_netra_common::{Error, Result};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn unreachable_backend() -> Result<()> {
        Err(Error::Network("connection refused".into()))
    }

    fn failing_call(busy: Busy) -> Result<()> {
        let _busy = busy.acquire();
        assert!(busy.is_busy());
        unreachable_backend()?;
        Ok(())
    }

    #[wasm_bindgen_test]
    fn wasm_busy_released_on_error_return() {
        let busy = Busy::new();
        assert!(failing_call(busy).is_err());
        assert!(!busy.is_busy());
    }

    #[wasm_bindgen_test]
    fn wasm_busy_until_last_overlapping_call_ends() {
        let busy = Busy::new();
        let first = busy.acquire();
        let second = busy.acquire();
        drop(first);
        assert!(busy.is_busy());
        drop(second);
        assert!(!busy.is_busy());
    }
}
