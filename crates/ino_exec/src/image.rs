//! The boundary to the operating system: replacing the process image
//! and rewriting the process environment.

use tracing::warn;

use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Operations which replace global process state.
pub trait ProcessImage {
    /// Replace the current process image with `program`.
    ///
    /// A `program` without `/` is searched in `$PATH` by the OS.
    /// `argv` is passed as is, its first element becomes `argv[0]`.
    /// Returning at all means failure.
    fn exec( &mut self, program: &OsStr, argv: &[OsString] ) -> io::Error;

    /// Throw away the whole environment and install `entries`,
    /// each being `KEY=VALUE`.
    fn replace_env( &mut self, entries: &[OsString] );
}

/// The real thing.
#[ derive( Debug, Clone, Copy, Default ) ]
pub struct Os;

impl ProcessImage for Os {
    #[ inline ]
    fn exec( &mut self, program: &OsStr, argv: &[OsString] ) -> io::Error {
        let mut cmd = Command::new( program );
        if let Some( ( arg0, args ) ) = argv.split_first() {
            cmd.arg0( arg0 ).args( args );
        }
        cmd.exec()
    }

    fn replace_env( &mut self, entries: &[OsString] ) {
        let stale = std::env::vars_os()
            .map( |( key, _ )| key )
            .filter( |key| is_valid_key( key ) )
            .collect::<Vec<_>>();

        // SAFETY: Environment replacement happens right before exec.
        // The caller guarantees no other thread is reading or writing
        // the environment at this point.
        unsafe {
            for key in stale {
                std::env::remove_var( key );
            }
            for entry in entries {
                match EnvEntry::parse( entry ) {
                    EnvEntry::Set( key, val ) => std::env::set_var( key, val ),
                    EnvEntry::Unset( key ) => std::env::remove_var( key ),
                    EnvEntry::Invalid =>
                        warn!( ?entry, "skip malformed environment entry" ),
                }
            }
        }
    }
}

/// One `KEY=VALUE` string, split the way `putenv(3)` reads it.
#[ derive( Debug, PartialEq, Eq ) ]
pub( crate ) enum EnvEntry<'a> {
    Set( &'a OsStr, &'a OsStr ),
    /// No `=` at all, the variable gets removed.
    Unset( &'a OsStr ),
    /// Would be rejected by [`std::env::set_var`].
    Invalid,
}

impl<'a> EnvEntry<'a> {
    pub( crate ) fn parse( entry: &'a OsStr ) -> Self {
        let bytes = entry.as_bytes();
        if bytes.contains( &0 ) {
            return Self::Invalid
        }
        match bytes.iter().position( |b| *b == b'=' ) {
            Some( 0 ) => Self::Invalid,
            Some( at ) => {
                let ( key, val ) = bytes.split_at( at );
                let val = val.get( 1.. ).unwrap_or_default();
                Self::Set( OsStr::from_bytes( key ), OsStr::from_bytes( val ) )
            },
            None if bytes.is_empty() => Self::Invalid,
            None => Self::Unset( entry ),
        }
    }
}

fn is_valid_key( key: &OsStr ) -> bool {
    let bytes = key.as_bytes();
    !bytes.is_empty() && !bytes.iter().any( |b| *b == b'=' || *b == 0 )
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {
    use super::*;

    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use assert2::check;

    use std::io::ErrorKind;

    #[ test ]
    fn parse_entries() {
        let parse = |s: &'static str| EnvEntry::parse( s.as_ref() );
        check!( parse( "A=1" ) == EnvEntry::Set( "A".as_ref(), "1".as_ref() ) );
        check!( parse( "A=" ) == EnvEntry::Set( "A".as_ref(), "".as_ref() ) );
        check!( parse( "A=b=c" )
            == EnvEntry::Set( "A".as_ref(), "b=c".as_ref() ) );
        check!( parse( "A" ) == EnvEntry::Unset( "A".as_ref() ) );
        check!( parse( "=x" ) == EnvEntry::Invalid );
        check!( parse( "" ) == EnvEntry::Invalid );
        check!( parse( "A=\0" ) == EnvEntry::Invalid );
    }

    #[ test ]
    fn valid_keys() {
        check!( is_valid_key( "PATH".as_ref() ) );
        check!( !is_valid_key( "".as_ref() ) );
        check!( !is_valid_key( "=C:".as_ref() ) );
    }

    #[ test ]
    fn exec_missing_program() {
        let err = Os.exec(
            "/nonexistent/ino-exec-test".as_ref(),
            &[ "ino-exec-test".into() ],
        );
        check!( err.kind() == ErrorKind::NotFound );
    }

    #[ test ]
    fn exec_not_executable() {
        let top = TempDir::new().unwrap();
        let file = top.child( "plain" );
        file.write_str( "nothing to see" ).unwrap();

        let err = Os.exec( file.path().as_os_str(), &[] );
        check!( err.kind() == ErrorKind::PermissionDenied );
    }
}
