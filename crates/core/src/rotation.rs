//! Shape table and rotation-system loader
//!
//! A [`RotationSystem`] holds one immutable [`ShapeData`] per shape: the four
//! orientation tile maps plus the three kick tables (CW, CCW, HALF). It is
//! built once, from the compiled-in standard rules or from an externally
//! supplied JSON configuration, and then shared read-only by every piece
//! spawned during a match. Custom configurations let a lobby play rule
//! variants, as long as every participant receives the exact same text.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridfall_types::{Orientation, PieceKind, Spin, SPAWN_X, SPAWN_Y};

use crate::piece::Piece;

/// Square occupancy grid for one orientation of one shape.
///
/// Stored bottom-row-first to match board coordinates; constructors take rows
/// top-first (the way humans draw them) and flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    size: u8,
    cells: Vec<bool>,
}

impl TileMap {
    /// Build from rows listed top row first, `'x'` marking occupied cells.
    pub fn from_rows(rows: &[&str]) -> Result<Self, String> {
        let size = rows.len();
        if size == 0 {
            return Err("empty tile map".to_string());
        }
        let mut cells = vec![false; size * size];
        for (i, row) in rows.iter().enumerate() {
            if row.chars().count() != size {
                return Err(format!(
                    "row {} has {} cells, expected {} (maps must be square)",
                    i,
                    row.chars().count(),
                    size
                ));
            }
            let y = size - 1 - i;
            for (x, c) in row.chars().enumerate() {
                cells[y * size + x] = match c {
                    'x' | 'X' => true,
                    '.' => false,
                    other => return Err(format!("unexpected map character {:?}", other)),
                };
            }
        }
        Ok(Self {
            size: size as u8,
            cells,
        })
    }

    /// Side length of the bounding box.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Whether the relative cell `(x, y)` is occupied (y = 0 is the bottom).
    pub fn is_occupied(&self, x: u8, y: u8) -> bool {
        x < self.size && y < self.size && self.cells[y as usize * self.size as usize + x as usize]
    }

    /// Iterate the occupied `(dx, dy)` offsets, bottom-left origin.
    pub fn occupied(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        let size = self.size as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &set)| set)
            .map(move |(idx, _)| ((idx % size) as i8, (idx / size) as i8))
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&set| set).count()
    }

    fn to_rows(&self) -> Vec<String> {
        let size = self.size as usize;
        (0..size)
            .rev()
            .map(|y| {
                (0..size)
                    .map(|x| if self.cells[y * size + x] { 'x' } else { '.' })
                    .collect()
            })
            .collect()
    }
}

/// One ordered candidate-offset list per originating orientation.
pub type KickTable = [Vec<(i8, i8)>; 4];

/// The three kick tables of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickSet {
    cw: KickTable,
    ccw: KickTable,
    half: KickTable,
}

impl KickSet {
    /// The table matching a rotation direction.
    pub fn table(&self, spin: Spin) -> &KickTable {
        match spin {
            Spin::Cw => &self.cw,
            Spin::Ccw => &self.ccw,
            Spin::Half => &self.half,
        }
    }

    /// The candidate offsets for rotating `spin` out of orientation `from`.
    pub fn offsets(&self, spin: Spin, from: Orientation) -> &[(i8, i8)] {
        &self.table(spin)[from.index()]
    }
}

/// Immutable definition shared by every piece of one shape kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeData {
    kind: PieceKind,
    maps: [TileMap; 4],
    kicks: KickSet,
}

impl ShapeData {
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The occupancy grid for one orientation.
    pub fn map(&self, orientation: Orientation) -> &TileMap {
        &self.maps[orientation.index()]
    }

    pub fn kicks(&self) -> &KickSet {
        &self.kicks
    }
}

/// Error produced when an external rotation-rules configuration cannot be
/// turned into a complete [`RotationSystem`]. Always fatal to match start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid rotation rules json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rotation rules missing shape `{0}`")]
    MissingShape(&'static str),
    #[error("unknown shape name `{0}`")]
    UnknownShape(String),
    #[error("shape `{shape}`, orientation `{orientation}`: {problem}")]
    BadMap {
        shape: String,
        orientation: &'static str,
        problem: String,
    },
    #[error("shape `{shape}`, `{table}` kick table: {problem}")]
    BadKicks {
        shape: String,
        table: &'static str,
        problem: String,
    },
}

/// A complete, immutable rotation system: shape table for the seven
/// tetrominoes plus the non-rotating garbage block.
#[derive(Debug, Clone)]
pub struct RotationSystem {
    shapes: [Arc<ShapeData>; 8],
}

fn kind_slot(kind: PieceKind) -> usize {
    match kind {
        PieceKind::I => 0,
        PieceKind::O => 1,
        PieceKind::L => 2,
        PieceKind::J => 3,
        PieceKind::S => 4,
        PieceKind::Z => 5,
        PieceKind::T => 6,
        PieceKind::Garbage => 7,
    }
}

impl RotationSystem {
    /// The compiled-in standard rules (guideline shapes and kick tables,
    /// half-rotations with the identity offset only).
    pub fn standard() -> Self {
        let shapes = [
            PieceKind::I,
            PieceKind::O,
            PieceKind::L,
            PieceKind::J,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::T,
            PieceKind::Garbage,
        ]
        .map(|kind| Arc::new(builtin_shape(kind)));
        Self { shapes }
    }

    /// Parse an externally supplied configuration.
    ///
    /// All seven spawnable shapes must be fully defined; the garbage block
    /// may be omitted, in which case the built-in 1x1 block is used. Any
    /// malformed or incomplete entry fails the whole load; a match must
    /// never start on a silently defaulted table.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: RulesDoc = serde_json::from_str(text)?;

        for name in doc.shapes.keys() {
            if PieceKind::from_str(name).is_none() {
                return Err(ConfigError::UnknownShape(name.clone()));
            }
        }

        let build = |kind: PieceKind| -> Result<Arc<ShapeData>, ConfigError> {
            match doc.shapes.get(kind.as_str()) {
                Some(entry) => Ok(Arc::new(shape_from_doc(kind, entry)?)),
                None if kind == PieceKind::Garbage => Ok(Arc::new(builtin_shape(kind))),
                None => Err(ConfigError::MissingShape(kind.as_str())),
            }
        };

        Ok(Self {
            shapes: [
                build(PieceKind::I)?,
                build(PieceKind::O)?,
                build(PieceKind::L)?,
                build(PieceKind::J)?,
                build(PieceKind::S)?,
                build(PieceKind::Z)?,
                build(PieceKind::T)?,
                build(PieceKind::Garbage)?,
            ],
        })
    }

    /// Canonical serialization, suitable for byte-identical distribution to
    /// every match participant.
    pub fn to_json(&self) -> String {
        let shapes = self
            .shapes
            .iter()
            .map(|shape| {
                let maps = shape.maps.each_ref().map(|m| m.to_rows());
                let [e, r, r2, r3] = maps;
                let kicks = KicksDoc {
                    cw: kick_table_doc(&shape.kicks.cw),
                    ccw: kick_table_doc(&shape.kicks.ccw),
                    half: kick_table_doc(&shape.kicks.half),
                };
                (
                    shape.kind.as_str().to_string(),
                    ShapeDoc {
                        maps: MapsDoc { e, r, r2, r3 },
                        kicks,
                    },
                )
            })
            .collect();
        let doc = RulesDoc { shapes };
        serde_json::to_string(&doc).expect("rotation rules serialize to plain json")
    }

    /// The shared definition for a shape kind.
    pub fn shape(&self, kind: PieceKind) -> &Arc<ShapeData> {
        &self.shapes[kind_slot(kind)]
    }

    /// The orientation-E occupancy grid (preview rendering).
    pub fn spawn_map(&self, kind: PieceKind) -> &TileMap {
        self.shape(kind).map(Orientation::E)
    }

    /// Instantiate a piece at the canonical spawn anchor in orientation E.
    pub fn spawn(&self, kind: PieceKind) -> Piece {
        Piece::new(Arc::clone(self.shape(kind)), SPAWN_X, SPAWN_Y)
    }
}

// ---------------- configuration document ----------------

#[derive(Debug, Serialize, Deserialize)]
struct RulesDoc {
    shapes: BTreeMap<String, ShapeDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ShapeDoc {
    maps: MapsDoc,
    kicks: KicksDoc,
}

#[derive(Debug, Serialize, Deserialize)]
struct MapsDoc {
    e: Vec<String>,
    r: Vec<String>,
    r2: Vec<String>,
    r3: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KicksDoc {
    cw: Vec<Vec<[i8; 2]>>,
    ccw: Vec<Vec<[i8; 2]>>,
    half: Vec<Vec<[i8; 2]>>,
}

fn kick_table_doc(table: &KickTable) -> Vec<Vec<[i8; 2]>> {
    table
        .iter()
        .map(|list| list.iter().map(|&(dx, dy)| [dx, dy]).collect())
        .collect()
}

fn shape_from_doc(kind: PieceKind, doc: &ShapeDoc) -> Result<ShapeData, ConfigError> {
    let make_map = |orientation: &'static str, rows: &[String]| -> Result<TileMap, ConfigError> {
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        TileMap::from_rows(&refs).map_err(|problem| ConfigError::BadMap {
            shape: kind.as_str().to_string(),
            orientation,
            problem,
        })
    };
    let maps = [
        make_map("e", &doc.maps.e)?,
        make_map("r", &doc.maps.r)?,
        make_map("r2", &doc.maps.r2)?,
        make_map("r3", &doc.maps.r3)?,
    ];
    let size = maps[0].size();
    for (map, name) in maps.iter().zip(["e", "r", "r2", "r3"]) {
        if map.size() != size {
            return Err(ConfigError::BadMap {
                shape: kind.as_str().to_string(),
                orientation: name,
                problem: format!("size {} differs from orientation e ({})", map.size(), size),
            });
        }
    }

    let make_table = |table: &'static str, lists: &[Vec<[i8; 2]>]| -> Result<KickTable, ConfigError> {
        if lists.len() != 4 {
            return Err(ConfigError::BadKicks {
                shape: kind.as_str().to_string(),
                table,
                problem: format!("{} offset lists, expected one per orientation", lists.len()),
            });
        }
        let mut out: KickTable = Default::default();
        for (i, list) in lists.iter().enumerate() {
            if list.is_empty() {
                return Err(ConfigError::BadKicks {
                    shape: kind.as_str().to_string(),
                    table,
                    problem: format!("orientation {} has an empty offset list", i),
                });
            }
            out[i] = list.iter().map(|&[dx, dy]| (dx, dy)).collect();
        }
        Ok(out)
    };
    let kicks = KickSet {
        cw: make_table("cw", &doc.kicks.cw)?,
        ccw: make_table("ccw", &doc.kicks.ccw)?,
        half: make_table("half", &doc.kicks.half)?,
    };

    Ok(ShapeData { kind, maps, kicks })
}

// ---------------- compiled-in standard tables ----------------

// Kick offsets are (dx, dy) with y growing upward, listed in the order they
// are tried; the identity offset comes first by convention. The offsets for
// J, L, S, T and Z share one table; I has its own; O and the garbage block
// never displace.
const KICKS_JLSTZ_CW: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

const KICKS_JLSTZ_CCW: [[(i8, i8); 5]; 4] = [
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

const KICKS_I_CW: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
];

const KICKS_I_CCW: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
];

// TODO: tune non-identity half-rotation offsets
fn identity_kicks() -> KickTable {
    std::array::from_fn(|_| vec![(0, 0)])
}

fn table(rows: &[[(i8, i8); 5]; 4]) -> KickTable {
    rows.each_ref().map(|list| list.to_vec())
}

fn builtin_maps(kind: PieceKind) -> [TileMap; 4] {
    // Rows are written top row first, exactly as the shapes look on screen.
    let rows: [&[&str]; 4] = match kind {
        PieceKind::I => [
            &["....", "xxxx", "....", "...."],
            &["..x.", "..x.", "..x.", "..x."],
            &["....", "....", "xxxx", "...."],
            &[".x..", ".x..", ".x..", ".x.."],
        ],
        PieceKind::O => [
            &["...", ".xx", ".xx"],
            &["...", ".xx", ".xx"],
            &["...", ".xx", ".xx"],
            &["...", ".xx", ".xx"],
        ],
        PieceKind::L => [
            &["..x", "xxx", "..."],
            &[".x.", ".x.", ".xx"],
            &["...", "xxx", "x.."],
            &["xx.", ".x.", ".x."],
        ],
        PieceKind::J => [
            &["x..", "xxx", "..."],
            &[".xx", ".x.", ".x."],
            &["...", "xxx", "..x"],
            &[".x.", ".x.", "xx."],
        ],
        PieceKind::S => [
            &[".xx", "xx.", "..."],
            &[".x.", ".xx", "..x"],
            &["...", ".xx", "xx."],
            &["x..", "xx.", ".x."],
        ],
        PieceKind::Z => [
            &["xx.", ".xx", "..."],
            &["..x", ".xx", ".x."],
            &["...", "xx.", ".xx"],
            &[".x.", "xx.", "x.."],
        ],
        PieceKind::T => [
            &[".x.", "xxx", "..."],
            &[".x.", ".xx", ".x."],
            &["...", "xxx", ".x."],
            &[".x.", "xx.", ".x."],
        ],
        PieceKind::Garbage => [&["x"], &["x"], &["x"], &["x"]],
    };
    rows.map(|r| TileMap::from_rows(r).expect("built-in shape tables are well-formed"))
}

fn builtin_shape(kind: PieceKind) -> ShapeData {
    let kicks = match kind {
        PieceKind::I => KickSet {
            cw: table(&KICKS_I_CW),
            ccw: table(&KICKS_I_CCW),
            half: identity_kicks(),
        },
        PieceKind::O | PieceKind::Garbage => KickSet {
            cw: identity_kicks(),
            ccw: identity_kicks(),
            half: identity_kicks(),
        },
        _ => KickSet {
            cw: table(&KICKS_JLSTZ_CW),
            ccw: table(&KICKS_JLSTZ_CCW),
            half: identity_kicks(),
        },
    };
    ShapeData {
        kind,
        maps: builtin_maps(kind),
        kicks,
    }
}
