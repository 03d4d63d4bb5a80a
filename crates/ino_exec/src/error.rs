use std::ffi::OsString;
use std::io;
use std::io::ErrorKind;

/// Exit code for a program which can't be found, as SUSv3 mandates.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Exit code for a program which was found but couldn't be run.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

#[ derive( thiserror::Error, Debug ) ]
pub enum LaunchError {
    /// Only applets may run and there's none under this name.
    #[ error( "No such file or directory (only applets allowed)" ) ]
    Denied { name: OsString },

    /// The OS refused to replace the process image.
    #[ error( "{source}" ) ]
    Exec { program: OsString, source: io::Error },
}

impl LaunchError {
    /// Whether the failure boils down to "no such entry".
    #[ must_use ]
    pub fn is_not_found( &self ) -> bool {
        match self {
            Self::Denied { .. } => true,
            Self::Exec { source, .. } => source.kind() == ErrorKind::NotFound,
        }
    }

    /// The errno behind this failure, [`rustix::io::Errno::NOENT`]
    /// for policy denials.
    #[ must_use ]
    pub fn raw_os_error( &self ) -> Option<i32> {
        match self {
            Self::Denied { .. } => Some( rustix::io::Errno::NOENT.raw_os_error() ),
            Self::Exec { source, .. } => source.raw_os_error(),
        }
    }

    /// 127 for a missing program, 126 for everything else.
    #[ must_use ]
    pub fn exit_code( &self ) -> i32 {
        if self.is_not_found() {
            EXIT_NOT_FOUND
        } else {
            EXIT_CANNOT_EXECUTE
        }
    }
}

#[ cfg( test ) ]
mod test {
    use super::*;
    use assert2::check;

    fn exec_error( errno: rustix::io::Errno ) -> LaunchError {
        LaunchError::Exec {
            program: "prog".into(),
            source: io::Error::from_raw_os_error( errno.raw_os_error() ),
        }
    }

    #[ test ]
    fn exit_codes() {
        use rustix::io::Errno;

        check!( exec_error( Errno::NOENT ).exit_code() == 127 );
        check!( exec_error( Errno::ACCESS ).exit_code() == 126 );
        check!( exec_error( Errno::NOEXEC ).exit_code() == 126 );
        check!( exec_error( Errno::NOTDIR ).exit_code() == 126 );
        check!( LaunchError::Denied { name: "x".into() }.exit_code() == 127 );
    }

    #[ test ]
    fn os_error_preserved() {
        use rustix::io::Errno;

        check!( exec_error( Errno::ACCESS ).raw_os_error()
            == Some( Errno::ACCESS.raw_os_error() ) );
        check!( LaunchError::Denied { name: "x".into() }.raw_os_error()
            == Some( Errno::NOENT.raw_os_error() ) );
    }
}
