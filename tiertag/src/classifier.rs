//! ティアごとの系列分類器
//!
//! 分類器は[`SequenceClassifier`]トレイトの背後に隠された不透明な能力として扱われます。
//! スパン全体の特徴量プールを受け取り、トークンごとのラベルを返します。
//!
//! 標準の実装は線形連鎖モデル[`LinearChainModel`]で、状態特徴量の重みとラベル間の
//! 遷移重みからビタビアルゴリズムで最良のラベル列を求めます。モデルは`rkyv`で
//! シリアライズされ、各ティアのディレクトリに`model.bin`として置かれます。
pub mod crfsuite;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::Path;

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    Archive, Deserialize, Serialize, access, api::serialize_using, ser::Serializer,
    ser::allocator::Arena, ser::sharing::Share, ser::writer::IoWriter, util::with_arena,
};

use crate::errors::{Result, TiertagError};
use crate::feature::FeatureSet;
use crate::utils::FromU32;

/// ティアのモデルファイル名。
pub const MODEL_FILE_NAME: &str = "model.bin";

/// ティアモデルを識別するマジックバイト。
pub const MODEL_MAGIC: &[u8] = b"TiertagTierModel 0.1\n";

const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MODEL_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;

/// 系列分類器。
///
/// 実装は複数のスレッドから同時に呼び出されても安全である必要があります。
pub trait SequenceClassifier: Send + Sync {
    /// スパン全体を分類し、トークンごとのラベルを返します。
    ///
    /// ラベルは文法素名を[`LABEL_SEPARATOR`](crate::feature::label::LABEL_SEPARATOR)で
    /// 連結した文字列です。戻り値の長さは`span`と一致する必要があります。
    ///
    /// # エラー
    ///
    /// 分類に失敗した場合にエラーを返します。
    fn classify(&self, span: &[FeatureSet]) -> Result<Vec<String>>;
}

impl<C> SequenceClassifier for Box<C>
where
    C: SequenceClassifier + ?Sized,
{
    fn classify(&self, span: &[FeatureSet]) -> Result<Vec<String>> {
        (**self).classify(span)
    }
}

/// 線形連鎖モデル。
///
/// 状態特徴量は`名前=値`のキーでソートされ、キーごとに`(ラベルID, 重み)`の列を持ちます。
#[derive(Archive, Serialize, Deserialize, Debug, Default)]
pub struct LinearChainModel {
    labels: Vec<String>,
    features: Vec<String>,
    // weights of features[i] are at [offsets[i], offsets[i + 1])
    offsets: Vec<u32>,
    state_labels: Vec<u32>,
    state_weights: Vec<f64>,
    // row-major, transitions[prev * labels.len() + cur]
    transitions: Vec<f64>,
}

/// ビタビ復号に必要なスコアへのアクセス。
trait Scorer {
    fn num_labels(&self) -> usize;
    fn label(&self, i: usize) -> &str;
    fn add_state_scores(&self, key: &str, scores: &mut [f64]);
    fn transition(&self, prev: usize, cur: usize) -> f64;
}

impl Scorer for LinearChainModel {
    #[inline(always)]
    fn num_labels(&self) -> usize {
        self.labels.len()
    }

    #[inline(always)]
    fn label(&self, i: usize) -> &str {
        &self.labels[i]
    }

    fn add_state_scores(&self, key: &str, scores: &mut [f64]) {
        if let Ok(i) = self.features.binary_search_by(|f| f.as_str().cmp(key)) {
            let start = usize::from_u32(self.offsets[i]);
            let end = usize::from_u32(self.offsets[i + 1]);
            for j in start..end {
                scores[usize::from_u32(self.state_labels[j])] += self.state_weights[j];
            }
        }
    }

    #[inline(always)]
    fn transition(&self, prev: usize, cur: usize) -> f64 {
        self.transitions[prev * self.labels.len() + cur]
    }
}

impl Scorer for ArchivedLinearChainModel {
    #[inline(always)]
    fn num_labels(&self) -> usize {
        self.labels.len()
    }

    #[inline(always)]
    fn label(&self, i: usize) -> &str {
        self.labels[i].as_str()
    }

    fn add_state_scores(&self, key: &str, scores: &mut [f64]) {
        if let Ok(i) = self.features.binary_search_by(|f| f.as_str().cmp(key)) {
            let start = usize::from_u32(self.offsets[i].to_native());
            let end = usize::from_u32(self.offsets[i + 1].to_native());
            for j in start..end {
                scores[usize::from_u32(self.state_labels[j].to_native())] +=
                    self.state_weights[j].to_native();
            }
        }
    }

    #[inline(always)]
    fn transition(&self, prev: usize, cur: usize) -> f64 {
        self.transitions[prev * self.labels.len() + cur].to_native()
    }
}

impl ArchivedLinearChainModel {
    /// 復号中の添字がすべて範囲内に収まることを確かめます。
    fn check_tables(&self) -> Result<()> {
        let l = self.labels.len();
        let n = self.state_labels.len();
        let bad = |msg: &str| Err(TiertagError::invalid_format("model", msg));
        if self.transitions.len() != l * l {
            return bad("transition table does not match the number of labels");
        }
        if self.offsets.len() != self.features.len() + 1 || self.state_weights.len() != n {
            return bad("inconsistent table sizes");
        }
        let offsets = || self.offsets.iter().map(|o| usize::from_u32(o.to_native()));
        if offsets().next() != Some(0)
            || offsets().zip(offsets().skip(1)).any(|(a, b)| a > b)
            || offsets().last() != Some(n)
        {
            return bad("feature offsets are not increasing within the state table");
        }
        if self
            .state_labels
            .iter()
            .any(|id| usize::from_u32(id.to_native()) >= l)
        {
            return bad("state weight refers to an unknown label");
        }
        Ok(())
    }
}

/// ビタビアルゴリズムで最良のラベル列を求めます。
fn viterbi<M>(model: &M, span: &[FeatureSet]) -> Result<Vec<String>>
where
    M: Scorer + ?Sized,
{
    let n = span.len();
    let l = model.num_labels();
    if n == 0 {
        return Ok(vec![]);
    }
    if l == 0 {
        return Err(TiertagError::invalid_state("model has no labels", ""));
    }

    let mut state = vec![0.0; n * l];
    for (t, fs) in span.iter().enumerate() {
        let row = &mut state[t * l..(t + 1) * l];
        for f in fs.iter() {
            model.add_state_scores(&f.to_string(), row);
        }
    }

    let mut best = state[..l].to_vec();
    let mut back = vec![0usize; n * l];
    for t in 1..n {
        let mut next = vec![f64::NEG_INFINITY; l];
        for cur in 0..l {
            for prev in 0..l {
                let s = best[prev] + model.transition(prev, cur);
                if s > next[cur] {
                    next[cur] = s;
                    back[t * l + cur] = prev;
                }
            }
            next[cur] += state[t * l + cur];
        }
        best = next;
    }

    let mut y = 0;
    for i in 1..l {
        if best[i] > best[y] {
            y = i;
        }
    }
    let mut path = vec![0usize; n];
    path[n - 1] = y;
    for t in (1..n).rev() {
        path[t - 1] = back[t * l + path[t]];
    }
    Ok(path.into_iter().map(|i| model.label(i).to_string()).collect())
}

impl LinearChainModel {
    /// ラベルの一覧を返します。
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 状態特徴量のキーの数を返します。
    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// モデルをシリアライズしてライターに書き込みます。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、または`rkyv`シリアライゼーションでエラーが発生した場合に
    /// エラーを返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        wtr.write_all(&vec![0xFF; PADDING_LEN])?;

        with_arena(|arena: &mut Arena| {
            let writer = IoWriter::new(&mut wtr);
            let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
            serialize_using::<_, rkyv::rancor::Error>(self, &mut serializer)
        })
        .map_err(|e| TiertagError::invalid_state("rkyv serialization failed", e.to_string()))?;

        Ok(())
    }
}

/// 線形連鎖モデルを構築するビルダー。
pub struct LinearChainModelBuilder {
    labels: Vec<String>,
    label_ids: BTreeMap<String, u32>,
    states: BTreeMap<String, BTreeMap<u32, f64>>,
    transitions: Vec<f64>,
}

impl LinearChainModelBuilder {
    /// ラベル集合を指定してビルダーを作成します。
    ///
    /// # エラー
    ///
    /// ラベルが空の場合、または重複している場合にエラーを返します。
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(TiertagError::invalid_argument("labels", "no labels"));
        }
        let mut label_ids = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            if label_ids.insert(label.clone(), u32::try_from(i)?).is_some() {
                return Err(TiertagError::invalid_argument(
                    "labels",
                    format!("duplicate label '{label}'"),
                ));
            }
        }
        let l = labels.len();
        Ok(Self {
            labels,
            label_ids,
            states: BTreeMap::new(),
            transitions: vec![0.0; l * l],
        })
    }

    fn label_id(&self, label: &str) -> Result<u32> {
        self.label_ids.get(label).copied().ok_or_else(|| {
            TiertagError::invalid_argument("label", format!("unknown label '{label}'"))
        })
    }

    /// 状態特徴量`key`(`名前=値`)とラベルの組に重みを加えます。
    pub fn add_state_weight(&mut self, key: &str, label: &str, weight: f64) -> Result<&mut Self> {
        let id = self.label_id(label)?;
        *self
            .states
            .entry(key.to_string())
            .or_default()
            .entry(id)
            .or_default() += weight;
        Ok(self)
    }

    /// ラベル`prev`から`cur`への遷移重みを設定します。
    pub fn set_transition(&mut self, prev: &str, cur: &str, weight: f64) -> Result<&mut Self> {
        let p = usize::from_u32(self.label_id(prev)?);
        let c = usize::from_u32(self.label_id(cur)?);
        self.transitions[p * self.labels.len() + c] = weight;
        Ok(self)
    }

    /// モデルを構築します。
    pub fn build(self) -> Result<LinearChainModel> {
        let mut features = Vec::with_capacity(self.states.len());
        let mut offsets = Vec::with_capacity(self.states.len() + 1);
        let mut state_labels = vec![];
        let mut state_weights = vec![];
        offsets.push(0);
        for (key, weights) in self.states {
            features.push(key);
            for (label, w) in weights {
                state_labels.push(label);
                state_weights.push(w);
            }
            offsets.push(u32::try_from(state_labels.len())?);
        }
        Ok(LinearChainModel {
            labels: self.labels,
            features,
            offsets,
            state_labels,
            state_weights,
            transitions: self.transitions,
        })
    }
}

/// アーカイブ形式のティアモデル。
pub struct ArchivedTierModel {
    _buffer: AlignedVec<16>,
    data: &'static ArchivedLinearChainModel,
}

impl Deref for ArchivedTierModel {
    type Target = ArchivedLinearChainModel;
    fn deref(&self) -> &Self::Target {
        self.data
    }
}

/// ティアに割り当てられる分類モデル。
pub enum TierModel {
    Archived(ArchivedTierModel),
    Owned(LinearChainModel),
}

impl TierModel {
    /// 構築済みのモデルから作成します。
    pub fn from_model(model: LinearChainModel) -> Self {
        Self::Owned(model)
    }

    /// リーダーからモデルを読み込みます。
    ///
    /// # エラー
    ///
    /// マジックナンバーが一致しない場合、またはデータが破損している場合にエラーを返します。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0; MODEL_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if !magic.starts_with(MODEL_MAGIC) {
            return Err(TiertagError::invalid_argument(
                "rdr",
                "The magic number of the input model mismatches.",
            ));
        }
        let mut padding_buf = vec![0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;
        let mut aligned_bytes = AlignedVec::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let archived = access::<ArchivedLinearChainModel, Error>(&aligned_bytes).map_err(|e| {
            TiertagError::invalid_state(
                "rkyv validation failed. The model file may be corrupted or incompatible.",
                e.to_string(),
            )
        })?;
        archived.check_tables()?;
        // SAFETY: AlignedVec ensures correct alignment and lives as long as the returned value.
        let data: &'static ArchivedLinearChainModel = unsafe { &*(archived as *const _) };

        Ok(Self::Archived(ArchivedTierModel {
            _buffer: aligned_bytes,
            data,
        }))
    }

    /// ファイルからモデルを読み込みます。
    ///
    /// # エラー
    ///
    /// ファイルが存在しない場合は[`TiertagError::Configuration`]を返します。
    /// その他の失敗は[`read`](Self::read)と同様です。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TiertagError::configuration(format!(
                "missing model artifact {}: {e}",
                path.display()
            ))
        })?;
        Self::read(std::io::BufReader::new(file))
    }

    /// ラベルの数を返します。
    pub fn num_labels(&self) -> usize {
        match self {
            Self::Archived(m) => m.num_labels(),
            Self::Owned(m) => m.num_labels(),
        }
    }
}

impl SequenceClassifier for TierModel {
    fn classify(&self, span: &[FeatureSet]) -> Result<Vec<String>> {
        match self {
            Self::Archived(m) => viterbi(&**m, span),
            Self::Owned(m) => viterbi(m, span),
        }
    }
}

impl SequenceClassifier for LinearChainModel {
    fn classify(&self, span: &[FeatureSet]) -> Result<Vec<String>> {
        viterbi(self, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::feature::{Feature, FeatureSource};

    fn span(words: &[&str]) -> Vec<FeatureSet> {
        words
            .iter()
            .map(|w| {
                let mut fs = FeatureSet::new();
                fs.add(FeatureSource::Token, [Feature::new("w", *w)]);
                fs
            })
            .collect()
    }

    fn model() -> LinearChainModel {
        let mut b = LinearChainModelBuilder::new(["NOUN", "VERB", "ADJF"]).unwrap();
        b.add_state_weight("w=мама", "NOUN", 2.0).unwrap();
        b.add_state_weight("w=мыла", "VERB", 1.0).unwrap();
        b.add_state_weight("w=мыла", "NOUN", 0.9).unwrap();
        b.add_state_weight("w=раму", "NOUN", 2.0).unwrap();
        b.set_transition("NOUN", "VERB", 0.5).unwrap();
        b.set_transition("NOUN", "NOUN", -1.0).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_viterbi() {
        let m = model();
        assert_eq!(
            vec!["NOUN", "VERB", "NOUN"],
            m.classify(&span(&["мама", "мыла", "раму"])).unwrap()
        );
        assert!(m.classify(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_transition_overrides_state() {
        let mut b = LinearChainModelBuilder::new(["A", "B"]).unwrap();
        b.add_state_weight("w=x", "A", 1.0).unwrap();
        b.add_state_weight("w=y", "A", 0.2).unwrap();
        b.set_transition("A", "A", -5.0).unwrap();
        let m = b.build().unwrap();
        assert_eq!(vec!["A", "B"], m.classify(&span(&["x", "y"])).unwrap());
    }

    #[test]
    fn test_write_and_read() {
        let m = model();
        let mut buf = vec![];
        m.write(&mut buf).unwrap();
        let loaded = TierModel::read(buf.as_slice()).unwrap();
        assert_eq!(3, loaded.num_labels());
        let s = span(&["мама", "мыла", "раму", "мыла"]);
        assert_eq!(m.classify(&s).unwrap(), loaded.classify(&s).unwrap());
    }

    fn read_back(m: &LinearChainModel) -> Result<TierModel> {
        let mut buf = vec![];
        m.write(&mut buf).unwrap();
        TierModel::read(buf.as_slice())
    }

    #[test]
    fn test_read_corrupt_tables() {
        let mut m = model();
        m.state_labels[0] = 3;
        assert!(matches!(read_back(&m), Err(TiertagError::InvalidFormat(_))));

        let mut m = model();
        m.offsets.swap(1, 2);
        assert!(matches!(read_back(&m), Err(TiertagError::InvalidFormat(_))));

        let mut m = model();
        *m.offsets.last_mut().unwrap() += 1;
        assert!(matches!(read_back(&m), Err(TiertagError::InvalidFormat(_))));

        let mut m = model();
        m.transitions.pop();
        assert!(matches!(read_back(&m), Err(TiertagError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TierModel::from_path(dir.path().join(MODEL_FILE_NAME)),
            Err(TiertagError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_rejects_unknown_label() {
        let mut b = LinearChainModelBuilder::new(["A"]).unwrap();
        assert!(b.add_state_weight("w=x", "B", 1.0).is_err());
        assert!(LinearChainModelBuilder::new(["A", "A"]).is_err());
    }
}
