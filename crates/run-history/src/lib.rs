//! 実行履歴管理
//!
//! 1 回の生成ごとに記録を作り、容量付きのバッファに保持します。
//! 容量を超えると古い記録から削除されます（FIFO）。プロセス終了後は残りません。

mod buffer;
mod record;

pub use buffer::{HistoryBuffer, SharedHistory, DEFAULT_CAPACITY};
pub use record::HistoryRecord;
