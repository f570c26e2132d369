//! Interfaces to the compilers which consume rewritten models.
//!
//! Accelerator toolchains require static shapes, which is why models are
//! rewritten. This module only describes how a rewritten model is handed
//! over. Compilation itself happens in an external service or executable.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{info, warn};

/// Errors reported when invoking a compiler.
#[derive(Debug)]
pub enum BackendError {
    /// The SDK root directory does not exist.
    SdkNotFound(PathBuf),

    /// The SDK does not contain a model converter for this host.
    ConverterNotFound(PathBuf),

    /// The compiler could not be started.
    Io(io::Error),

    /// The compilation service returned an error.
    Service(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SdkNotFound(path) => write!(f, "SDK not found at {}", path.display()),
            Self::ConverterNotFound(path) => {
                write!(f, "model converter not found in {}", path.display())
            }
            Self::Io(err) => write!(f, "failed to run compiler: {}", err),
            Self::Service(msg) => write!(f, "compilation service error: {}", msg),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BackendError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Request to compile a model for a device.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileRequest {
    /// Path of the rewritten model.
    pub artifact: PathBuf,

    /// Name of the target device, eg. "Samsung Galaxy S24".
    pub device: String,
}

impl CompileRequest {
    /// Return the file name a compiled binary for this request is saved as,
    /// eg. `model_qnn_samsung_galaxy_s24.bin`.
    pub fn binary_name(&self) -> String {
        let stem = self
            .artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let device = self.device.replace(' ', "_").to_lowercase();
        format!("{}_qnn_{}.bin", stem, device)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompileOutcome {
    /// Path of the downloaded binary, if compilation succeeded.
    pub binary: Option<PathBuf>,
    pub success: bool,

    /// Diagnostic message from the service.
    pub message: String,
}

/// A remote service which compiles models for a target device.
pub trait CloudCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, BackendError>;
}

#[derive(Clone, Debug)]
pub struct ToolchainOutcome {
    /// Exit status of the last tool that ran.
    pub status: ExitStatus,

    /// Files created by the toolchain.
    pub generated: Vec<PathBuf>,

    /// Standard error output of the last tool that ran.
    pub stderr: String,
}

/// A local toolchain which converts a model into source or binary form.
pub trait LocalToolchain {
    fn convert(&self, artifact: &Path, output: &Path) -> Result<ToolchainOutcome, BackendError>;
}

/// Host directories under `<sdk>/bin` which may contain SDK tools, in
/// preference order.
const HOST_DIRS: [(&str, &str); 2] = [
    ("x86_64-linux-clang", ""),
    ("x86_64-windows-msvc", ".exe"),
];

/// Toolchain from a locally installed vendor SDK.
///
/// Conversion runs `qnn-onnx-converter`, which emits C++ source for the
/// model. If the SDK also has `qnn-model-lib-generator`, that is then used to
/// build a model library from the source.
#[derive(Clone, Debug)]
pub struct SdkToolchain {
    root: PathBuf,
    target: String,
}

impl SdkToolchain {
    pub fn new<P: Into<PathBuf>>(root: P) -> SdkToolchain {
        SdkToolchain {
            root: root.into(),
            target: "aarch64-android".to_string(),
        }
    }

    /// Set the target triple passed to the library generator.
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    fn find_tool(&self, name: &str) -> Option<PathBuf> {
        HOST_DIRS
            .iter()
            .map(|(host, ext)| {
                self.root
                    .join("bin")
                    .join(host)
                    .join(format!("{}{}", name, ext))
            })
            .find(|path| path.is_file())
    }

    /// Return the path of the model converter.
    pub fn converter(&self) -> Result<PathBuf, BackendError> {
        if !self.root.is_dir() {
            return Err(BackendError::SdkNotFound(self.root.clone()));
        }
        self.find_tool("qnn-onnx-converter")
            .ok_or_else(|| BackendError::ConverterNotFound(self.root.clone()))
    }

    /// Return the path of the model library generator, if the SDK has one.
    pub fn lib_generator(&self) -> Option<PathBuf> {
        self.find_tool("qnn-model-lib-generator")
    }

    fn convert_command(converter: &Path, artifact: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(converter);
        cmd.arg("--input_network")
            .arg(artifact)
            .arg("--output_path")
            .arg(output);
        cmd
    }

    fn lib_command(&self, generator: &Path, source: &Path, library: &Path) -> Command {
        let mut cmd = Command::new(generator);
        cmd.arg("-c")
            .arg(source)
            .arg("-b")
            .arg(library)
            .arg("-t")
            .arg(&self.target);
        cmd
    }
}

/// Return the path of the model library built from generated `source`,
/// eg. `out/model_qnn.bin` for `out/model.cpp`.
fn library_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}_qnn.bin", stem))
}

impl LocalToolchain for SdkToolchain {
    /// Convert `artifact` to C++ source at `output`, then build a library
    /// next to it if possible.
    ///
    /// Failure of the library step is logged but not returned, as the
    /// generated source is still usable.
    fn convert(&self, artifact: &Path, output: &Path) -> Result<ToolchainOutcome, BackendError> {
        let converter = self.converter()?;
        info!("Running {}", converter.display());

        let result = Self::convert_command(&converter, artifact, output).output()?;
        let mut outcome = ToolchainOutcome {
            status: result.status,
            generated: Vec::new(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        };
        if !result.status.success() {
            return Ok(outcome);
        }
        outcome.generated.push(output.to_path_buf());

        let Some(generator) = self.lib_generator() else {
            return Ok(outcome);
        };
        let library = library_path(output);
        let result = self.lib_command(&generator, output, &library).output()?;
        if result.status.success() {
            outcome.generated.push(library);
        } else {
            warn!(
                "Model library generation failed: {}",
                String::from_utf8_lossy(&result.stderr)
            );
        }
        Ok(outcome)
    }
}
