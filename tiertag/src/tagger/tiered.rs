//! ティア分類器によるタガー
//!
//! スパンごとにティアを復号順に一つずつ処理します。ティア`t`の分類器が見る特徴量プールは
//! 共通特徴量、辞書、ティア`0..t`の確定ラベルだけから組み立てられるため、
//! 後段のティアの結果が前段に影響することはありません。
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::classifier::{MODEL_FILE_NAME, SequenceClassifier, TierModel};
use crate::config::{CONFIG_FILE_NAME, ModelConfig};
use crate::dictionary::MorphDictionary;
use crate::errors::{Result, TiertagError};
use crate::feature::{FeaturePipeline, FeatureSet, label};
use crate::tagger::Tagger;
use crate::token::{Token, TokenTag, Wordform};
use crate::utils::FromU32;

/// ティアごとの系列分類器を順に適用するタガー。
pub struct TieredTagger {
    pipeline: FeaturePipeline,
    classifiers: Vec<Arc<dyn SequenceClassifier>>,
    pos_category: String,
}

impl TieredTagger {
    /// 新しいタガーを作成します。
    ///
    /// # 引数
    ///
    /// * `pipeline` - 特徴量パイプライン
    /// * `classifiers` - 復号順に並んだティアごとの分類器
    /// * `pos_category` - 品詞として扱うカテゴリ
    ///
    /// # エラー
    ///
    /// 分類器の数がティアの数と一致しない場合、または品詞カテゴリが未登録の場合に
    /// [`TiertagError::Configuration`]を返します。
    pub fn new<S>(
        pipeline: FeaturePipeline,
        classifiers: Vec<Arc<dyn SequenceClassifier>>,
        pos_category: S,
    ) -> Result<Self>
    where
        S: Into<String>,
    {
        let tier_count = pipeline.partition().tier_count();
        if classifiers.len() != tier_count {
            return Err(TiertagError::configuration(format!(
                "{} classifiers are given for {tier_count} tiers",
                classifiers.len()
            )));
        }
        let pos_category = pos_category.into();
        if !pipeline.catalog().is_category(&pos_category) {
            return Err(TiertagError::configuration(format!(
                "pos category '{pos_category}' is not a registered category"
            )));
        }
        Ok(Self {
            pipeline,
            classifiers,
            pos_category,
        })
    }

    /// モデルディレクトリからタガーを読み込みます。
    ///
    /// ディレクトリには`model.conf`と、ティアIDごとのサブディレクトリに置かれた
    /// `model.bin`が必要です。
    ///
    /// # エラー
    ///
    /// 設定ファイルやモデルファイルが見つからない場合、設定が不正な場合、
    /// または辞書が`catalog`と異なるカタログで構築されている場合に
    /// [`TiertagError::Configuration`]を返します。
    pub fn from_dir<P>(
        dir: P,
        catalog: Arc<GrammemeCatalog>,
        dictionary: Arc<MorphDictionary>,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let conf_path = dir.join(CONFIG_FILE_NAME);
        let conf_file = File::open(&conf_path).map_err(|e| {
            TiertagError::configuration(format!("{}: {e}", conf_path.display()))
        })?;
        let config = ModelConfig::from_reader(conf_file)?;
        let partition = config.partition(&catalog)?;
        dictionary.verify_catalog(&catalog)?;

        let mut classifiers: Vec<Arc<dyn SequenceClassifier>> = vec![];
        for id in config.tier_ids() {
            let model = TierModel::from_path(dir.join(id).join(MODEL_FILE_NAME))?;
            log::info!(
                "[tiertag] loaded tier '{id}' with {} labels",
                model.num_labels()
            );
            classifiers.push(Arc::new(model));
        }

        let pipeline = FeaturePipeline::new(
            catalog,
            Arc::new(partition),
            dictionary,
            config.window()?,
        );
        Self::new(pipeline, classifiers, config.pos_category())
    }

    #[inline(always)]
    pub const fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// 新しいワーカーを作成します。
    ///
    /// ワーカーはスパンごとの特徴量とラベルを保持します。複数のスレッドで
    /// 並行に処理する場合はスレッドごとにワーカーを作成してください。
    pub fn new_worker(&self) -> Worker<'_> {
        Worker {
            tagger: self,
            span: vec![],
            common: vec![],
            candidates: vec![],
            pools: vec![],
            labels: vec![],
        }
    }

    fn tier_label_bits(&self, tier: usize, label: &str) -> Result<TagBits> {
        let catalog = self.pipeline.catalog();
        let tier_mask = self.pipeline.partition().tier_mask(tier);
        let mut bits = catalog.empty_bits();
        for g in label::split(label) {
            let num_id = catalog.num_id(g).ok_or_else(|| {
                TiertagError::classification(
                    self.pipeline.partition().tier_id(tier),
                    format!("unknown grammeme '{g}' in label '{label}'"),
                )
            })?;
            let i = usize::from_u32(num_id);
            if !tier_mask.get(i) {
                return Err(TiertagError::classification(
                    self.pipeline.partition().tier_id(tier),
                    format!("grammeme '{g}' does not belong to the tier"),
                ));
            }
            bits.set(i);
        }
        Ok(bits)
    }
}

/// スパンごとの復号状態を保持するワーカー。
pub struct Worker<'a> {
    tagger: &'a TieredTagger,
    span: Vec<String>,
    common: Vec<FeatureSet>,
    candidates: Vec<Vec<TagBits>>,
    pools: Vec<Vec<FeatureSet>>,
    labels: Vec<Vec<String>>,
}

impl Worker<'_> {
    /// 処理するスパンを設定し、前のスパンの状態を破棄します。
    pub fn reset_span<I, S>(&mut self, span: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.span.clear();
        self.span.extend(span.into_iter().map(Into::into));
        self.common.clear();
        self.candidates.clear();
        self.pools.clear();
        self.labels.clear();
    }

    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.span.len()
    }

    /// すべてのティアを復号順に処理します。
    ///
    /// # エラー
    ///
    /// 分類器が失敗した場合、ラベルの数がトークン数と一致しない場合、
    /// またはラベルに未知の文法素やティア外の文法素が含まれる場合に
    /// [`TiertagError::Classification`]を返します。
    pub fn decode(&mut self) -> Result<()> {
        let pipeline = &self.tagger.pipeline;
        self.common = pipeline.common_features(&self.span);
        self.candidates = pipeline.candidates(&self.span);
        self.pools.clear();
        self.labels.clear();

        for (t, classifier) in self.tagger.classifiers.iter().enumerate() {
            let tier_id = pipeline.partition().tier_id(t);
            let pool = pipeline.tier_pool(&self.common, &self.candidates, &self.labels, t)?;
            let labels = classifier
                .classify(&pool)
                .map_err(|e| TiertagError::classification(tier_id, e.to_string()))?;
            if labels.len() != self.span.len() {
                return Err(TiertagError::classification(
                    tier_id,
                    format!(
                        "{} labels are returned for {} tokens",
                        labels.len(),
                        self.span.len()
                    ),
                ));
            }
            for l in &labels {
                self.tagger.tier_label_bits(t, l)?;
            }
            log::debug!(
                "[tiertag] tier '{tier_id}' decoded {} tokens",
                self.span.len()
            );
            self.pools.push(pool);
            self.labels.push(labels);
        }
        Ok(())
    }

    /// ティア`tier`の分類器に渡された特徴量プールを返します。
    pub fn pool(&self, tier: usize) -> Option<&[FeatureSet]> {
        self.pools.get(tier).map(Vec::as_slice)
    }

    /// ティア`tier`の確定ラベルを返します。
    pub fn labels(&self, tier: usize) -> Option<&[String]> {
        self.labels.get(tier).map(Vec::as_slice)
    }

    /// 全ティアのラベルを合わせたタグを返します。
    ///
    /// どのティアも文法素を出力しなかったトークンは[`TokenTag::Untagged`]になります。
    ///
    /// # エラー
    ///
    /// 復号が完了していない場合は[`TiertagError::InvalidState`]を、
    /// 排他的なカテゴリに複数の値が付いた場合は
    /// [`TiertagError::InconsistentAnnotation`]を返します。
    pub fn tags(&self) -> Result<Vec<TokenTag>> {
        let tagger = self.tagger;
        if self.labels.len() != tagger.classifiers.len() {
            return Err(TiertagError::invalid_state(
                "span is not decoded",
                format!("{} of {} tiers", self.labels.len(), tagger.classifiers.len()),
            ));
        }
        let catalog = tagger.pipeline.catalog();
        let mut tags = Vec::with_capacity(self.span.len());
        for pos in 0..self.span.len() {
            let mut bits = catalog.empty_bits();
            for (t, labels) in self.labels.iter().enumerate() {
                bits.union_with(&tagger.tier_label_bits(t, &labels[pos])?);
            }
            tagger.pipeline.partition().check_consistent(&bits)?;
            if bits.is_empty() {
                tags.push(TokenTag::Untagged);
            } else {
                tags.push(TokenTag::Tagged(Wordform::from_bits(
                    catalog,
                    &tagger.pos_category,
                    &bits,
                )));
            }
        }
        Ok(tags)
    }
}

impl Tagger for TieredTagger {
    fn tag(&self, span: &[Token]) -> Result<Vec<TokenTag>> {
        let mut worker = self.new_worker();
        worker.reset_span(span.iter().map(Token::text));
        worker.decode()?;
        worker.tags()
    }
}
