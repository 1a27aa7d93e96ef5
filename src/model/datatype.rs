//! Character datatype validators.
//!
//! A [DataType] defines the alphabet of a character matrix: a lookup table
//! from symbol to the set of unambiguous states it represents (IUPAC
//! ambiguity codes included), a missing-data symbol and, for most kinds, a
//! gap symbol. Continuous data has no fixed alphabet and validates tokens
//! as numbers. A mixed datatype partitions matrix columns into contiguous
//! ranges, each governed by its own sub-validator.

use crate::error::Error;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Default missing-data symbol
const DEFAULT_MISSING: char = '?';
/// Default gap symbol (for kinds that have one)
const DEFAULT_GAP: char = '-';

/// Symbol to unambiguous-state-set lookup table.
///
/// BTreeMap so iteration (equality checks, debugging output) is ordered.
pub type SymbolLookup = BTreeMap<char, Vec<char>>;

// =#========================================================================#=
// DATATYPE KIND
// =#========================================================================#=
/// The variant of a [DataType].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTypeKind {
    Dna,
    Rna,
    /// Generic nucleotide, accepting both T and U
    Nucleotide,
    Protein,
    /// Discrete states with numeric-like symbols (0-9); no gap by default
    Standard,
    /// Restriction sites, binary 0/1
    Restriction,
    /// Free-form numbers, no fixed lookup
    Continuous,
    /// User-supplied lookup table
    Custom,
    /// Ordered, non-overlapping column ranges with independent sub-validators
    Mixed,
}

impl fmt::Display for DataTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DataTypeKind::Dna => "dna",
            DataTypeKind::Rna => "rna",
            DataTypeKind::Nucleotide => "nucleotide",
            DataTypeKind::Protein => "protein",
            DataTypeKind::Standard => "standard",
            DataTypeKind::Restriction => "restriction",
            DataTypeKind::Continuous => "continuous",
            DataTypeKind::Custom => "custom",
            DataTypeKind::Mixed => "mixed",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DataTypeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(DataTypeKind::Dna),
            "rna" => Ok(DataTypeKind::Rna),
            "nucleotide" => Ok(DataTypeKind::Nucleotide),
            "protein" => Ok(DataTypeKind::Protein),
            "standard" => Ok(DataTypeKind::Standard),
            "restriction" => Ok(DataTypeKind::Restriction),
            "continuous" => Ok(DataTypeKind::Continuous),
            "custom" => Ok(DataTypeKind::Custom),
            "mixed" => Ok(DataTypeKind::Mixed),
            other => Err(Error::BadArguments(format!("unknown datatype kind {other:?}"))),
        }
    }
}

// =#========================================================================#=
// MIXED RANGE
// =#========================================================================#=
/// One contiguous column range of a mixed [DataType].
///
/// Ranges are assigned greedily from column 0 upward; columns beyond the
/// last range fall to the last range's validator (open remainder).
#[derive(Debug, Clone, PartialEq)]
pub struct MixedRange {
    /// First column governed by this range (0-based)
    start: usize,
    /// Number of columns in this range
    length: usize,
    /// Validator governing the range
    datatype: DataType,
}

impl MixedRange {
    /// First column of the range (0-based, inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of columns in the range.
    pub fn length(&self) -> usize {
        self.length
    }

    /// The sub-validator governing this range.
    pub fn datatype(&self) -> &DataType {
        &self.datatype
    }
}

// =#========================================================================#=
// DATATYPE
// =#========================================================================#=
/// Alphabet definition and validator for character-state sequences.
///
/// # Example
/// ```
/// use phylodata::model::datatype::DataType;
///
/// let dna = DataType::dna();
/// assert!(dna.is_valid("ACGT"));
/// assert!(dna.is_valid("ACN?-"));
/// assert!(!dna.is_valid("ACE"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    kind: DataTypeKind,
    /// None for continuous data
    lookup: Option<SymbolLookup>,
    missing: char,
    gap: Option<char>,
    /// Non-empty only for mixed
    ranges: Vec<MixedRange>,
}

// ============================================================================
// Construction
// ============================================================================
impl DataType {
    fn fixed(kind: DataTypeKind, lookup: SymbolLookup, gap: Option<char>) -> Self {
        DataType {
            kind,
            lookup: Some(lookup),
            missing: DEFAULT_MISSING,
            gap,
            ranges: Vec::new(),
        }
    }

    /// DNA: A, C, G, T plus IUPAC ambiguity codes.
    pub fn dna() -> Self {
        Self::fixed(DataTypeKind::Dna, nucleotide_lookup(b'T'), Some(DEFAULT_GAP))
    }

    /// RNA: A, C, G, U plus IUPAC ambiguity codes.
    pub fn rna() -> Self {
        Self::fixed(DataTypeKind::Rna, nucleotide_lookup(b'U'), Some(DEFAULT_GAP))
    }

    /// Generic nucleotide data accepting both T and U.
    pub fn nucleotide() -> Self {
        let mut lookup = nucleotide_lookup(b'T');
        lookup.insert('U', vec!['T']);
        Self::fixed(DataTypeKind::Nucleotide, lookup, Some(DEFAULT_GAP))
    }

    /// Protein: the 20 amino acids plus B, Z, X ambiguities and the stop `*`.
    pub fn protein() -> Self {
        let mut lookup = SymbolLookup::new();
        for aa in "ACDEFGHIKLMNPQRSTVWY".chars() {
            lookup.insert(aa, vec![aa]);
        }
        lookup.insert('B', vec!['D', 'N']);
        lookup.insert('Z', vec!['E', 'Q']);
        lookup.insert('X', "ACDEFGHIKLMNPQRSTVWY".chars().collect());
        lookup.insert('*', vec!['*']);
        Self::fixed(DataTypeKind::Protein, lookup, Some(DEFAULT_GAP))
    }

    /// Standard discrete states with symbols 0-9; no gap symbol.
    pub fn standard() -> Self {
        let mut lookup = SymbolLookup::new();
        for digit in '0'..='9' {
            lookup.insert(digit, vec![digit]);
        }
        Self::fixed(DataTypeKind::Standard, lookup, None)
    }

    /// Restriction sites, binary 0/1; no gap symbol.
    pub fn restriction() -> Self {
        let mut lookup = SymbolLookup::new();
        lookup.insert('0', vec!['0']);
        lookup.insert('1', vec!['1']);
        Self::fixed(DataTypeKind::Restriction, lookup, None)
    }

    /// Continuous data: tokens validate as numbers, no lookup, no gap.
    pub fn continuous() -> Self {
        DataType {
            kind: DataTypeKind::Continuous,
            lookup: None,
            missing: DEFAULT_MISSING,
            gap: None,
            ranges: Vec::new(),
        }
    }

    /// A datatype with a user-supplied lookup table.
    pub fn custom(lookup: SymbolLookup) -> Self {
        Self::fixed(DataTypeKind::Custom, lookup, Some(DEFAULT_GAP))
    }

    /// A mixed datatype whose columns are partitioned into contiguous
    /// ranges, assigned greedily from column 0 upward. Columns beyond the
    /// last range fall to the last range's validator.
    ///
    /// Only fixed-alphabet kinds may appear as sub-ranges; custom lookups,
    /// continuous data and nested mixing are rejected.
    ///
    /// # Errors
    /// [Error::BadArguments] if `ranges` is empty, a length is zero, or a
    /// sub-kind is not a fixed-alphabet kind.
    ///
    /// # Example
    /// ```
    /// use phylodata::model::datatype::{DataType, DataTypeKind};
    ///
    /// let mixed = DataType::mixed(&[(DataTypeKind::Dna, 4), (DataTypeKind::Standard, 3)]).unwrap();
    /// assert_eq!(mixed.kind_descriptor(), "mixed(dna:1-4, standard:5-7)");
    /// assert!(mixed.is_valid("ACGT012"));
    /// assert!(!mixed.is_valid("0CGT012"));
    /// ```
    pub fn mixed(ranges: &[(DataTypeKind, usize)]) -> Result<Self, Error> {
        if ranges.is_empty() {
            return Err(Error::BadArguments("mixed datatype requires a non-empty range list".to_string()));
        }

        let mut assigned = Vec::with_capacity(ranges.len());
        let mut start = 0;
        for (kind, length) in ranges {
            if *length == 0 {
                return Err(Error::BadArguments(format!("mixed range of kind {kind} has zero length")));
            }
            let datatype = match kind {
                DataTypeKind::Mixed | DataTypeKind::Custom | DataTypeKind::Continuous => {
                    return Err(Error::BadArguments(format!(
                        "kind {kind} cannot be a mixed sub-range"
                    )));
                }
                other => Self::from_kind(*other)?,
            };
            assigned.push(MixedRange {
                start,
                length: *length,
                datatype,
            });
            start += length;
        }

        Ok(DataType {
            kind: DataTypeKind::Mixed,
            lookup: None,
            missing: DEFAULT_MISSING,
            gap: Some(DEFAULT_GAP),
            ranges: assigned,
        })
    }

    /// Creates the datatype for a kind that needs no further arguments.
    ///
    /// # Errors
    /// [Error::Unimplemented] for [DataTypeKind::Custom] and
    /// [DataTypeKind::Mixed], which need explicit configuration
    /// ([DataType::custom], [DataType::mixed]).
    pub fn from_kind(kind: DataTypeKind) -> Result<Self, Error> {
        match kind {
            DataTypeKind::Dna => Ok(Self::dna()),
            DataTypeKind::Rna => Ok(Self::rna()),
            DataTypeKind::Nucleotide => Ok(Self::nucleotide()),
            DataTypeKind::Protein => Ok(Self::protein()),
            DataTypeKind::Standard => Ok(Self::standard()),
            DataTypeKind::Restriction => Ok(Self::restriction()),
            DataTypeKind::Continuous => Ok(Self::continuous()),
            DataTypeKind::Custom => Err(Error::Unimplemented(
                "custom datatype needs a lookup table, use DataType::custom".to_string(),
            )),
            DataTypeKind::Mixed => Err(Error::Unimplemented(
                "mixed datatype needs a range list, use DataType::mixed".to_string(),
            )),
        }
    }
}

// ============================================================================
// Accessors and configuration
// ============================================================================
impl DataType {
    /// Returns the kind of this datatype.
    pub fn kind(&self) -> DataTypeKind {
        self.kind
    }

    /// Returns the symbol lookup table, or `None` for continuous data.
    pub fn lookup(&self) -> Option<&SymbolLookup> {
        self.lookup.as_ref()
    }

    /// Replaces the lookup table.
    ///
    /// On a continuous datatype this is a no-op: continuous data has no
    /// discrete alphabet. A warning is emitted instead of an error.
    pub fn set_lookup(&mut self, lookup: SymbolLookup) {
        if self.kind == DataTypeKind::Continuous {
            warn!("ignoring lookup table on continuous datatype");
            return;
        }
        self.lookup = Some(lookup);
    }

    /// Returns the missing-data symbol.
    pub fn missing(&self) -> char {
        self.missing
    }

    /// Sets the missing-data symbol.
    ///
    /// # Errors
    /// [Error::BadArguments] if `missing` equals the gap symbol.
    pub fn set_missing(&mut self, missing: char) -> Result<(), Error> {
        if self.gap == Some(missing) {
            return Err(Error::BadArguments(format!(
                "missing symbol {missing:?} collides with gap symbol"
            )));
        }
        self.missing = missing;
        Ok(())
    }

    /// Returns the gap symbol, if this kind has one.
    pub fn gap(&self) -> Option<char> {
        self.gap
    }

    /// Sets the gap symbol.
    ///
    /// # Errors
    /// [Error::BadArguments] if `gap` equals the missing symbol.
    pub fn set_gap(&mut self, gap: char) -> Result<(), Error> {
        if gap == self.missing {
            return Err(Error::BadArguments(format!(
                "gap symbol {gap:?} collides with missing symbol"
            )));
        }
        self.gap = Some(gap);
        Ok(())
    }

    /// Returns the mixed column ranges (empty for non-mixed kinds).
    pub fn ranges(&self) -> &[MixedRange] {
        &self.ranges
    }

    /// Returns the sub-validator governing `column` of a mixed datatype.
    /// Columns beyond the last range fall to the last range's validator.
    ///
    /// For non-mixed kinds returns `self`.
    pub fn subtype_at(&self, column: usize) -> &DataType {
        if self.ranges.is_empty() {
            return self;
        }
        for range in &self.ranges {
            if column < range.start + range.length {
                return &range.datatype;
            }
        }
        // open remainder
        &self.ranges[self.ranges.len() - 1].datatype
    }
}

// ============================================================================
// Validation, descriptor, equality
// ============================================================================
impl DataType {
    /// Validates a raw character row starting at column 0.
    ///
    /// The row is tokenized with [DataType::split] first.
    pub fn is_valid(&self, raw: &str) -> bool {
        let symbols = self.split(raw);
        self.is_valid_symbols_at(&symbols, 0)
    }

    /// Validates a pre-split symbol sequence starting at column 0.
    pub fn is_valid_symbols(&self, symbols: &[String]) -> bool {
        self.is_valid_symbols_at(symbols, 0)
    }

    /// Validates a pre-split symbol sequence whose first symbol sits at
    /// column `start` (relevant for mixed datatypes, where each column is
    /// delegated to the sub-validator governing it).
    pub fn is_valid_symbols_at(&self, symbols: &[String], start: usize) -> bool {
        match self.kind {
            DataTypeKind::Mixed => symbols
                .iter()
                .enumerate()
                .all(|(offset, symbol)| self.subtype_at(start + offset).symbol_ok(symbol)),
            _ => symbols.iter().all(|symbol| self.symbol_ok(symbol)),
        }
    }

    /// Validates a single symbol token against this (non-mixed) alphabet.
    fn symbol_ok(&self, symbol: &str) -> bool {
        if self.kind == DataTypeKind::Continuous {
            if symbol.len() == 1 && symbol.chars().next() == Some(self.missing) {
                return true;
            }
            return symbol.parse::<f64>().is_ok();
        }

        let mut chars = symbol.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            // fixed alphabets have single-character symbols only
            return false;
        };
        if c == self.missing || Some(c) == self.gap {
            return true;
        }
        match &self.lookup {
            Some(lookup) => lookup.contains_key(&c.to_ascii_uppercase()),
            None => false,
        }
    }

    /// Returns the canonical name of this datatype; for mixed, a composite
    /// descriptor like `mixed(dna:1-10, standard:11-15)` with consecutive
    /// identical sub-validators coalesced (columns 1-based inclusive).
    pub fn kind_descriptor(&self) -> String {
        if self.kind != DataTypeKind::Mixed {
            return self.kind.to_string();
        }

        let mut segments: Vec<(String, usize, usize)> = Vec::new();
        for range in &self.ranges {
            let name = range.datatype.kind_descriptor();
            let end = range.start + range.length;
            match segments.last_mut() {
                Some((last_name, _, last_end)) if *last_name == name => *last_end = end,
                _ => segments.push((name, range.start, end)),
            }
        }

        let parts: Vec<String> = segments
            .iter()
            .map(|(name, start, end)| format!("{name}:{}-{}", start + 1, end))
            .collect();
        format!("mixed({})", parts.join(", "))
    }

    /// Structural equality: same kind, same missing/gap symbols, same
    /// lookup, and for mixed the same per-range sub-validators.
    pub fn is_same(&self, other: &DataType) -> bool {
        self == other
    }

    /// Splits a raw row into the validator's per-symbol view.
    ///
    /// Continuous rows are whitespace-delimited; all other kinds treat each
    /// non-whitespace character as one symbol. `join(split(s))` is
    /// idempotent up to whitespace normalization.
    pub fn split(&self, raw: &str) -> Vec<String> {
        match self.kind {
            DataTypeKind::Continuous => raw.split_whitespace().map(str::to_string).collect(),
            _ => raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect(),
        }
    }

    /// Joins a symbol sequence back into a raw row,
    /// the inverse of [DataType::split].
    pub fn join(&self, symbols: &[String]) -> String {
        match self.kind {
            DataTypeKind::Continuous => symbols.join(" "),
            _ => symbols.concat(),
        }
    }
}

/// IUPAC nucleotide lookup with the given keto base (T for DNA, U for RNA).
fn nucleotide_lookup(keto: u8) -> SymbolLookup {
    let t = keto as char;
    let mut lookup = SymbolLookup::new();
    lookup.insert('A', vec!['A']);
    lookup.insert('C', vec!['C']);
    lookup.insert('G', vec!['G']);
    lookup.insert(t, vec![t]);
    lookup.insert('M', vec!['A', 'C']);
    lookup.insert('R', vec!['A', 'G']);
    lookup.insert('W', vec!['A', t]);
    lookup.insert('S', vec!['C', 'G']);
    lookup.insert('Y', vec!['C', t]);
    lookup.insert('K', vec!['G', t]);
    lookup.insert('V', vec!['A', 'C', 'G']);
    lookup.insert('H', vec!['A', 'C', t]);
    lookup.insert('D', vec!['A', 'G', t]);
    lookup.insert('B', vec!['C', 'G', t]);
    lookup.insert('N', vec!['A', 'C', 'G', t]);
    lookup.insert('X', vec!['A', 'C', 'G', t]);
    lookup
}
