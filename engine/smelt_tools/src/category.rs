//! Tool categories.

/// What role a tool plays in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    FortranCompiler,
    CCompiler,
    Linker,
    Archiver,
    Psyclone,
    Misc,
}

impl Category {
    #[must_use]
    pub fn is_compiler(self) -> bool {
        matches!(self, Self::FortranCompiler | Self::CCompiler)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::FortranCompiler => "Fortran compiler",
            Self::CCompiler => "C compiler",
            Self::Linker => "linker",
            Self::Archiver => "archiver",
            Self::Psyclone => "PSyclone",
            Self::Misc => "miscellaneous tool",
        };
        f.write_str(label)
    }
}
