//! ティアごとの学習データの生成
//!
//! 実行時の復号と同じ[`FeaturePipeline`]で特徴量プールを組み立て、CRFsuiteの
//! 学習データ形式(`ラベル\t属性\t属性...`、系列の間に空行)で書き出します。
//! 前段ティアの特徴量には正解ラベルを使います。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::classifier::crfsuite::{encode_label, escape_attribute};
use crate::errors::{Result, TiertagError};
use crate::feature::{FeaturePipeline, label};
use crate::trainer::corpus::{Corpus, Example};

/// 学習データのファイル名。
pub const TRAINING_FILE_NAME: &str = "train.crfsuite.txt";

/// CRFsuite形式の学習データを書き出すライター。
pub struct TrainingDataWriter {
    pipeline: FeaturePipeline,
}

impl TrainingDataWriter {
    pub fn new(pipeline: FeaturePipeline) -> Self {
        Self { pipeline }
    }

    #[inline(always)]
    pub const fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// スパンの正解ラベルをティアごとに求めます。
    ///
    /// 戻り値の`labels[t][pos]`はティア`t`の位置`pos`の正解ラベルです。
    ///
    /// # エラー
    ///
    /// 未登録の文法素が含まれる場合、または排他的なカテゴリに複数の値がある場合に
    /// エラーを返します。
    pub fn gold_labels(&self, example: &Example) -> Result<Vec<Vec<String>>> {
        let catalog = self.pipeline.catalog();
        let partition = self.pipeline.partition();
        let mut labels = vec![Vec::with_capacity(example.tokens().len()); partition.tier_count()];
        for word in example.tokens() {
            let bits = catalog.to_bits(word.grammemes()).map_err(|e| {
                TiertagError::invalid_format("corpus", format!("'{}': {e}", word.surface()))
            })?;
            partition.check_consistent(&bits)?;
            for (t, tier_labels) in labels.iter_mut().enumerate() {
                tier_labels.push(label::tier_label(catalog, partition, t, &bits));
            }
        }
        Ok(labels)
    }

    /// ティア`tier`の学習データを書き出します。
    ///
    /// # 戻り値
    ///
    /// 書き出した系列の数
    pub fn write_tier<W>(&self, corpus: &Corpus, tier: usize, wtr: W) -> Result<usize>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        for example in corpus.spans() {
            let surfaces = example.surfaces();
            let common = self.pipeline.common_features(&surfaces);
            let candidates = self.pipeline.candidates(&surfaces);
            let gold = self.gold_labels(example)?;
            let pool = self
                .pipeline
                .tier_pool(&common, &candidates, &gold[..tier], tier)?;
            for (fs, gold_label) in pool.iter().zip(&gold[tier]) {
                wtr.write_all(encode_label(gold_label).as_bytes())?;
                for f in fs.iter() {
                    write!(&mut wtr, "\t{}", escape_attribute(&f.to_string()))?;
                }
                writeln!(&mut wtr)?;
            }
            writeln!(&mut wtr)?;
        }
        wtr.flush()?;
        Ok(corpus.len())
    }

    /// すべてのティアの学習データを`<dir>/<tier>/`に書き出します。
    pub fn write_all<P>(&self, corpus: &Corpus, dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let partition = self.pipeline.partition();
        for t in 0..partition.tier_count() {
            let tier_dir = dir.join(partition.tier_id(t));
            fs::create_dir_all(&tier_dir)?;
            let n = self.write_tier(corpus, t, File::create(tier_dir.join(TRAINING_FILE_NAME))?)?;
            log::info!(
                "[tiertag] wrote {n} sequences for tier '{}'",
                partition.tier_id(t)
            );
        }
        Ok(())
    }
}
