//! # Domain Services
//!
//! 外部サービスに依存しない純粋なロジック
//!
//! - **identifier**: 識別子・URIの境界での検証
//! - **tabular**: クエリ結果の表形式への変換

pub mod identifier;
pub mod tabular;
