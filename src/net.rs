//! Loading and evaluating the small dense networks behind the image
//! classifiers.
//!
//! Weights live in a flat little-endian file: a four byte magic, three
//! `u32` dimensions (inputs, hidden, outputs), then the `f32` blobs for
//! the hidden weights, hidden biases, output weights and output biases.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// File magic expected at the start of a weights file.
pub const WEIGHTS_MAGIC: [u8; 4] = *b"CVN1";

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to read weights: {0}")]
    Io(#[from] io::Error),
    #[error("bad weights magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("unusable network dimensions {inputs}x{hidden}x{outputs}")]
    BadDimensions { inputs: u32, hidden: u32, outputs: u32 },
    #[error("weight blob {name} has {got} values, expected {expected}")]
    WeightCount {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("input has {got} values, network takes {expected}")]
    InputShape { expected: usize, got: usize },
    #[error("network has {got} outputs, classifier needs {expected}")]
    OutputShape { expected: usize, got: usize },
    #[error("weights previously failed to load")]
    Unavailable,
}

/// Dense network with one ReLU hidden layer and a linear output head.
///
/// Weight layout is input-major: `w1[i * hidden + h]` connects input `i`
/// to hidden unit `h`, and `w2[h * outputs + o]` connects hidden unit `h`
/// to output `o`.
#[derive(Debug, Clone)]
pub struct DenseNet {
    inputs: usize,
    hidden: usize,
    outputs: usize,
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
}

impl DenseNet {
    pub fn load(path: &Path) -> Result<Self, NetError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, NetError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != WEIGHTS_MAGIC {
            return Err(NetError::BadMagic { found: magic });
        }

        let inputs = read_u32(&mut reader)?;
        let hidden = read_u32(&mut reader)?;
        let outputs = read_u32(&mut reader)?;
        let bad_dimensions = NetError::BadDimensions {
            inputs,
            hidden,
            outputs,
        };
        if inputs == 0 || hidden == 0 || outputs == 0 {
            return Err(bad_dimensions);
        }
        let (Some(w1_len), Some(w2_len)) = (
            usize::try_from(inputs)
                .ok()
                .and_then(|i| i.checked_mul(hidden as usize)),
            usize::try_from(hidden)
                .ok()
                .and_then(|h| h.checked_mul(outputs as usize)),
        ) else {
            return Err(bad_dimensions);
        };

        let w1 = read_f32_vec(&mut reader, w1_len)?;
        let b1 = read_f32_vec(&mut reader, hidden as usize)?;
        let w2 = read_f32_vec(&mut reader, w2_len)?;
        let b2 = read_f32_vec(&mut reader, outputs as usize)?;

        Self::from_weights(
            inputs as usize,
            hidden as usize,
            outputs as usize,
            w1,
            b1,
            w2,
            b2,
        )
    }

    /// Builds a network from raw weight vectors, validating their lengths.
    #[allow(clippy::too_many_arguments)]
    pub fn from_weights(
        inputs: usize,
        hidden: usize,
        outputs: usize,
        w1: Vec<f32>,
        b1: Vec<f32>,
        w2: Vec<f32>,
        b2: Vec<f32>,
    ) -> Result<Self, NetError> {
        let check = |name: &'static str, expected: usize, got: usize| {
            if got == expected {
                Ok(())
            } else {
                Err(NetError::WeightCount {
                    name,
                    expected,
                    got,
                })
            }
        };
        check("w1", inputs * hidden, w1.len())?;
        check("b1", hidden, b1.len())?;
        check("w2", hidden * outputs, w2.len())?;
        check("b2", outputs, b2.len())?;
        Ok(Self {
            inputs,
            hidden,
            outputs,
            w1,
            b1,
            w2,
            b2,
        })
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Raw output activations for one input vector.
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>, NetError> {
        if input.len() != self.inputs {
            return Err(NetError::InputShape {
                expected: self.inputs,
                got: input.len(),
            });
        }

        let mut hidden = self.b1.clone();
        for (i, &x) in input.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            let row = &self.w1[i * self.hidden..(i + 1) * self.hidden];
            for (h, &w) in row.iter().enumerate() {
                hidden[h] += w * x;
            }
        }
        for h in hidden.iter_mut() {
            *h = h.max(0.0);
        }

        let mut out = self.b2.clone();
        for (h, &a) in hidden.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            let row = &self.w2[h * self.outputs..(h + 1) * self.outputs];
            for (o, &w) in row.iter().enumerate() {
                out[o] += w * a;
            }
        }
        Ok(out)
    }

    /// Single score squashed through a logistic sigmoid, for two-class
    /// heads with one output unit.
    pub fn forward_scalar(&self, input: &[f32]) -> Result<f32, NetError> {
        if self.outputs != 1 {
            return Err(NetError::OutputShape {
                expected: 1,
                got: self.outputs,
            });
        }
        let out = self.forward(input)?;
        Ok(sigmoid(out[0]))
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f32_vec(reader: &mut impl Read, len: usize) -> io::Result<Vec<f32>> {
    let mut values = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        reader.read_exact(&mut buf)?;
        values.push(f32::from_le_bytes(buf));
    }
    Ok(values)
}

/// Lazily loaded handle to a weights file.
///
/// The file is read on first use and the outcome is cached, so a handle
/// whose weights are missing or corrupt fails fast on every later call
/// instead of retrying the filesystem.
#[derive(Debug)]
pub struct LazyNet {
    path: PathBuf,
    state: LoadState,
}

#[derive(Debug)]
enum LoadState {
    Unloaded,
    Ready(DenseNet),
    Failed,
}

impl LazyNet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: LoadState::Unloaded,
        }
    }

    /// Wraps an already built network, for tests and offline tools.
    pub fn preloaded(net: DenseNet) -> Self {
        Self {
            path: PathBuf::new(),
            state: LoadState::Ready(net),
        }
    }

    pub fn get(&mut self) -> Result<&DenseNet, NetError> {
        if let LoadState::Unloaded = self.state {
            self.state = match DenseNet::load(&self.path) {
                Ok(net) => LoadState::Ready(net),
                Err(err) => {
                    log::warn!(
                        "failed to load weights from {}: {err}",
                        self.path.display()
                    );
                    LoadState::Failed
                }
            };
        }
        if let LoadState::Ready(net) = &self.state {
            Ok(net)
        } else {
            Err(NetError::Unavailable)
        }
    }
}
