use std::convert::Infallible;
use std::ffi::OsStr;
use std::ffi::OsString;

/// Programs implemented inside the running binary.
pub trait Applets {
    /// Opaque reference to one applet.
    type Handle: Copy + std::fmt::Debug;

    /// Look up the applet implementing `name`.
    fn find( &self, name: &OsStr ) -> Option<Self::Handle>;

    /// Whether the applet must run in the current process instead of
    /// getting a fresh process image.
    fn is_noexec( &self, handle: Self::Handle ) -> bool;

    /// Run the applet to completion, returning its exit code.
    fn run(
        &self,
        handle: Self::Handle,
        name: &OsStr,
        argv: &[OsString],
    ) -> i32;
}

/// An empty applet table, everything is an external program.
#[ derive( Debug, Clone, Copy, Default ) ]
pub struct NoApplets;

impl Applets for NoApplets {
    type Handle = Infallible;

    #[ inline ]
    fn find( &self, _: &OsStr ) -> Option<Self::Handle> {
        None
    }

    #[ inline ]
    fn is_noexec( &self, handle: Self::Handle ) -> bool {
        match handle {}
    }

    #[ inline ]
    fn run( &self, handle: Self::Handle, _: &OsStr, _: &[OsString] ) -> i32 {
        match handle {}
    }
}
