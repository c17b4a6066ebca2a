//! Injectable stand-ins for the optional flash-attention kernels.
//!
//! The policy code references a handful of modules of the `flash_attn` package. Instead of
//! patching a process-wide lookup table, the modules a policy may use are looked up in a
//! [`ModuleRegistry`] value that is handed to [`crate::PolicyFactory::build`]. When the real
//! kernels are unavailable, [`ModuleRegistry::install_flash_attn_stubs`] fills the registry
//! with inert entries so that policy construction still succeeds.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// The top-level package.
pub const FLASH_ATTN: &str = "flash_attn";

/// Submodule holding the attention interface.
pub const FLASH_ATTN_INTERFACE: &str = "flash_attn.flash_attn_interface";

/// Submodule holding the padding kernels, see [`PaddingKernels`].
pub const FLASH_ATTN_BERT_PADDING: &str = "flash_attn.bert_padding";

/// The compiled CUDA extension.
pub const FLASH_ATTN_CUDA: &str = "flash_attn_2_cuda";

/// Attribute of [`FLASH_ATTN`] that refers to [`FLASH_ATTN_INTERFACE`].
const INTERFACE_ATTRIBUTE: &str = "flash_attn_interface";

/// An argument to, or the result of, a kernel. The kernels decide what they accept.
pub type KernelValue = Box<dyn Any + Send>;

/// Arbitrary positional and keyword arguments to a kernel call.
#[derive(Default)]
pub struct KernelArgs {
    pub positional: Vec<KernelValue>,
    pub keyword: IndexMap<String, KernelValue>,
}

impl KernelArgs {
    #[must_use]
    pub fn arg(mut self, value: impl Any + Send) -> Self {
        self.positional.push(Box::new(value));
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Any + Send) -> Self {
        self.keyword.insert(name.into(), Box::new(value));
        self
    }
}

impl fmt::Debug for KernelArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelArgs")
            .field("positional", &self.positional.len())
            .field("keyword", &self.keyword.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The padding helpers of `flash_attn.bert_padding`.
pub trait PaddingKernels: Send + Sync {
    fn index_first_axis(&self, args: KernelArgs) -> Option<KernelValue>;

    fn pad_input(&self, args: KernelArgs) -> Option<KernelValue>;

    fn unpad_input(&self, args: KernelArgs) -> Option<KernelValue>;
}

/// Accepts anything and always returns `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPaddingKernels;

impl PaddingKernels for NoopPaddingKernels {
    fn index_first_axis(&self, _args: KernelArgs) -> Option<KernelValue> {
        None
    }

    fn pad_input(&self, _args: KernelArgs) -> Option<KernelValue> {
        None
    }

    fn unpad_input(&self, _args: KernelArgs) -> Option<KernelValue> {
        None
    }
}

/// One of the callables exported by [`FLASH_ATTN_BERT_PADDING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaddingKernel {
    IndexFirstAxis,
    PadInput,
    UnpadInput,
}

impl PaddingKernel {
    pub const ALL: [Self; 3] = [Self::IndexFirstAxis, Self::PadInput, Self::UnpadInput];

    pub fn name(self) -> &'static str {
        match self {
            Self::IndexFirstAxis => "index_first_axis",
            Self::PadInput => "pad_input",
            Self::UnpadInput => "unpad_input",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kernel| kernel.name() == name)
    }

    pub fn call(self, kernels: &dyn PaddingKernels, args: KernelArgs) -> Option<KernelValue> {
        match self {
            Self::IndexFirstAxis => kernels.index_first_axis(args),
            Self::PadInput => kernels.pad_input(args),
            Self::UnpadInput => kernels.unpad_input(args),
        }
    }
}

/// What a registered module name resolves to.
#[derive(Clone)]
pub enum ModuleEntry {
    /// A package whose attributes refer to other registered modules.
    Package {
        attributes: BTreeMap<String, String>,
    },

    /// The attention interface. The stub exposes no symbols.
    Interface,

    /// Module exporting the [`PaddingKernel`]s.
    Padding(Arc<dyn PaddingKernels>),

    /// A compiled extension, present but empty.
    NativeExtension,
}

impl ModuleEntry {
    /// The names this module exports.
    pub fn symbols(&self) -> Vec<&str> {
        match self {
            Self::Package { attributes } => attributes.keys().map(String::as_str).collect(),
            Self::Padding(_) => PaddingKernel::ALL.iter().map(|kernel| kernel.name()).collect(),
            Self::Interface | Self::NativeExtension => Vec::new(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Package { .. } => "package",
            Self::Interface => "interface",
            Self::Padding(_) => "padding",
            Self::NativeExtension => "native extension",
        }
    }
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("kind", &self.kind())
            .field("symbols", &self.symbols())
            .finish()
    }
}

/// A symbol looked up with [`ModuleRegistry::resolve_symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<'a> {
    /// An attribute naming another module.
    Module(&'a str),

    Kernel(PaddingKernel),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error(
        "No module named {0:?}. Install the flash-attention stubs, or provide a real implementation."
    )]
    ModuleNotFound(String),

    #[error("Module {module:?} has no attribute {symbol:?}")]
    SymbolNotFound { module: String, symbol: String },

    #[error("Module {module:?} is a {actual} module, expected a {expected} module")]
    UnexpectedModule {
        module: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Everything a policy needs from the attention kernels.
#[derive(Clone)]
pub struct AttentionKernels {
    pub padding: Arc<dyn PaddingKernels>,
}

impl fmt::Debug for AttentionKernels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttentionKernels").finish_non_exhaustive()
    }
}

/// Maps module names to the implementation a policy should use for them.
#[derive(Clone, Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleEntry>,
}

impl ModuleRegistry {
    /// An empty registry: no optional module is available.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flash_attn_stubs() -> Self {
        let mut registry = Self::new();
        registry.install_flash_attn_stubs();
        registry
    }

    /// Register `entry` under `name`, replacing whatever was there.
    pub fn insert(&mut self, name: impl Into<String>, entry: ModuleEntry) {
        self.modules.insert(name.into(), entry);
    }

    /// Register inert stand-ins for the `flash_attn` package.
    ///
    /// Installing twice leaves the registry exactly as after the first installation.
    pub fn install_flash_attn_stubs(&mut self) {
        self.insert(
            FLASH_ATTN,
            ModuleEntry::Package {
                attributes: BTreeMap::from([(
                    INTERFACE_ATTRIBUTE.to_owned(),
                    FLASH_ATTN_INTERFACE.to_owned(),
                )]),
            },
        );
        self.insert(FLASH_ATTN_INTERFACE, ModuleEntry::Interface);
        self.insert(
            FLASH_ATTN_BERT_PADDING,
            ModuleEntry::Padding(Arc::new(NoopPaddingKernels)),
        );
        self.insert(FLASH_ATTN_CUDA, ModuleEntry::NativeExtension);

        gr_log::info!("Flash Attention successfully mocked. Continuing with imports...");
    }

    /// Names of all registered modules, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn import(&self, name: &str) -> Result<&ModuleEntry, KernelError> {
        self.modules
            .get(name)
            .ok_or_else(|| KernelError::ModuleNotFound(name.to_owned()))
    }

    /// Look up `symbol` in the module registered as `module`.
    pub fn resolve_symbol<'a>(
        &'a self,
        module: &str,
        symbol: &str,
    ) -> Result<Symbol<'a>, KernelError> {
        let not_found = || KernelError::SymbolNotFound {
            module: module.to_owned(),
            symbol: symbol.to_owned(),
        };

        match self.import(module)? {
            ModuleEntry::Package { attributes } => attributes
                .get(symbol)
                .map(|target| Symbol::Module(target.as_str()))
                .ok_or_else(not_found),
            ModuleEntry::Padding(_) => PaddingKernel::from_name(symbol)
                .map(Symbol::Kernel)
                .ok_or_else(not_found),
            ModuleEntry::Interface | ModuleEntry::NativeExtension => Err(not_found()),
        }
    }

    /// The padding kernels registered under [`FLASH_ATTN_BERT_PADDING`].
    pub fn padding_kernels(&self) -> Result<Arc<dyn PaddingKernels>, KernelError> {
        match self.import(FLASH_ATTN_BERT_PADDING)? {
            ModuleEntry::Padding(kernels) => Ok(Arc::clone(kernels)),
            other => Err(KernelError::UnexpectedModule {
                module: FLASH_ATTN_BERT_PADDING.to_owned(),
                expected: "padding",
                actual: other.kind(),
            }),
        }
    }

    /// Perform every import a policy does at construction time.
    pub fn resolve_attention_kernels(&self) -> Result<AttentionKernels, KernelError> {
        let interface = match self.resolve_symbol(FLASH_ATTN, INTERFACE_ATTRIBUTE)? {
            Symbol::Module(interface) => interface,
            Symbol::Kernel(_) => {
                return Err(KernelError::SymbolNotFound {
                    module: FLASH_ATTN.to_owned(),
                    symbol: INTERFACE_ATTRIBUTE.to_owned(),
                });
            }
        };
        self.import(interface)?;
        self.import(FLASH_ATTN_CUDA)?;

        Ok(AttentionKernels {
            padding: self.padding_kernels()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(registry: &ModuleRegistry) -> Vec<(String, String)> {
        registry
            .module_names()
            .map(|name| {
                let entry = registry.import(name).unwrap();
                (name.to_owned(), format!("{entry:?}"))
            })
            .collect()
    }

    #[test]
    fn test_empty_registry_cannot_import() {
        let registry = ModuleRegistry::new();

        assert_eq!(
            registry.import(FLASH_ATTN).unwrap_err(),
            KernelError::ModuleNotFound(FLASH_ATTN.to_owned())
        );
        assert!(registry.resolve_attention_kernels().is_err());
    }

    #[test]
    fn test_stubs_install_four_modules() {
        let registry = ModuleRegistry::with_flash_attn_stubs();

        assert_eq!(
            registry.module_names().collect::<Vec<_>>(),
            vec![
                FLASH_ATTN,
                FLASH_ATTN_BERT_PADDING,
                FLASH_ATTN_INTERFACE,
                FLASH_ATTN_CUDA,
            ]
        );
        assert_eq!(
            registry.resolve_symbol(FLASH_ATTN, "flash_attn_interface"),
            Ok(Symbol::Module(FLASH_ATTN_INTERFACE))
        );
        assert_eq!(
            registry.import(FLASH_ATTN_BERT_PADDING).unwrap().symbols(),
            vec!["index_first_axis", "pad_input", "unpad_input"]
        );
        assert!(registry.import(FLASH_ATTN_CUDA).unwrap().symbols().is_empty());
        assert!(matches!(
            registry.resolve_symbol(FLASH_ATTN_CUDA, "fwd"),
            Err(KernelError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn test_installing_twice_is_idempotent() {
        let mut registry = ModuleRegistry::new();
        registry.install_flash_attn_stubs();
        let once = snapshot(&registry);

        registry.install_flash_attn_stubs();

        assert_eq!(snapshot(&registry), once);
        assert!(registry.resolve_attention_kernels().is_ok());
    }

    #[test]
    fn test_stub_kernels_return_nothing() {
        let kernels = ModuleRegistry::with_flash_attn_stubs()
            .resolve_attention_kernels()
            .unwrap();

        for kernel in PaddingKernel::ALL {
            let args = KernelArgs::default()
                .arg(vec![1.0_f32, 2.0, 3.0])
                .arg(42_usize)
                .kwarg("max_seqlen", 128_i64);
            assert!(kernel.call(kernels.padding.as_ref(), args).is_none());
        }
    }

    #[test]
    fn test_kernel_names_round_trip() {
        for kernel in PaddingKernel::ALL {
            assert_eq!(PaddingKernel::from_name(kernel.name()), Some(kernel));
        }
        assert_eq!(PaddingKernel::from_name("flash_attn_func"), None);
    }

    #[test]
    fn test_wrong_module_kind_for_padding() {
        let mut registry = ModuleRegistry::with_flash_attn_stubs();
        registry.insert(FLASH_ATTN_BERT_PADDING, ModuleEntry::NativeExtension);

        assert!(matches!(
            registry.padding_kernels(),
            Err(KernelError::UnexpectedModule {
                actual: "native extension",
                ..
            })
        ));
    }
}
