//! JSONL 编解码模块：批量提交记录的编码与结果记录的解码。
//!
//! # JSONL Codec
//!
//! Batch submissions and batch results are newline-delimited JSON files: one compact object
//! per line, newline-terminated.
//!
//! | Direction | Entry point | Line shape |
//! |-----------|-------------|------------|
//! | submit | [`encode_records`], [`write_jsonl_file`] | `{custom_id, method, url, body}` |
//! | retrieve | [`decode_results`], [`decode_results_with`] | `{id, custom_id, response, error}` |
//!
//! Decoding is fail-fast by default: one malformed line aborts the whole decode. Partial
//! tolerance is available through [`MalformedLinePolicy::Skip`].

pub mod decode;
pub mod encode;

pub use decode::{
    decode_results, decode_results_with, DecodeOptions, KindMismatchPolicy, MalformedLinePolicy,
    RecordError, ResultBody, ResultKind, ResultRecord, ResultResponse,
};
pub use encode::{
    decode_records, encode_records, write_jsonl_file, BatchRecord, BATCH_FILE_SIZE_LIMIT,
    CHAT_COMPLETIONS_URL, EMBEDDINGS_URL,
};

/// Non-empty lines with their 1-based line numbers. A trailing `\r` is dropped.
pub(crate) fn lines(data: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    data.split(|b| *b == b'\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix(b"\r").unwrap_or(line)))
        .filter(|(_, line)| !line.is_empty())
}
