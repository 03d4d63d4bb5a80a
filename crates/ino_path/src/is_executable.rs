//! Check whether a path names a runnable program.

use std::path::Path;

/// Extension trait for checking if the given path
/// is an executable regular file.
///
/// A path passes only if the calling process is allowed to
/// execute it (`access(2)` with `X_OK`) *and* `stat(2)` reports
/// a regular file. Directories carry the execute bit on Unix,
/// that's why the type check is needed.
///
/// No content is inspected, shebang lines and magic numbers
/// are left to the kernel.
pub trait IsExecutable
where
    Self: AsRef<Path>
{
    /// Check whether the file pointed by given path is an executable.
    ///
    /// Any error from the underlying queries, missing file included,
    /// counts as "not executable".
    fn is_executable( &self ) -> bool;
}

#[ cfg( unix ) ]
mod unix {

    use super::IsExecutable;
    use std::path::Path;

    impl IsExecutable for Path {
        #[ inline ]
        fn is_executable( &self ) -> bool {
            use rustix::fs::accessat;
            use rustix::fs::statat;
            use rustix::fs::Access;
            use rustix::fs::AtFlags;
            use rustix::fs::FileType;
            use rustix::fs::CWD;

            if let Err( err ) =
                accessat( CWD, self, Access::EXEC_OK, AtFlags::empty() )
            {
                tracing::trace!( path = ?self, ?err, "access denied" );
                return false
            }

            match statat( CWD, self, AtFlags::empty() ) {
                Ok( stat ) => FileType::from_raw_mode( stat.st_mode )
                    .is_file(),
                Err( err ) => {
                    tracing::trace!( path = ?self, ?err, "stat failed" );
                    false
                }
            }
        }
    }

    #[ cfg( test ) ]
    #[ allow( clippy::unwrap_used ) ]
    mod test {
        use super::*;

        use assert_fs::prelude::*;
        use assert_fs::TempDir;
        use assert2::check;

        use std::fs::set_permissions;
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        #[ test ]
        fn system_shell() {
            check!( Path::new( "/bin/sh" ).is_executable() );
        }

        #[ test ]
        fn directory_is_not_executable() {
            // Unix directory has the x bit but isn't a program
            check!( !Path::new( "/" ).is_executable() );
        }

        #[ test ]
        fn missing_file() {
            let top = TempDir::new().unwrap();
            check!( !top.child( "nope" ).path().is_executable() );
        }

        #[ test ]
        fn permission_bits() {
            let top = TempDir::new().unwrap();
            let file = top.child( "prog" );
            file.write_str( "#!/bin/sh\n" ).unwrap();

            set_permissions( &file, Permissions::from_mode( 0o644 ) )
                .unwrap();
            check!( !file.path().is_executable() );

            set_permissions( &file, Permissions::from_mode( 0o755 ) )
                .unwrap();
            check!( file.path().is_executable() );
        }

        #[ test ]
        fn symlink_to_executable() {
            let top = TempDir::new().unwrap();
            let link = top.child( "sh" );
            link.symlink_to_file( "/bin/sh" ).unwrap();
            check!( link.path().is_executable() );
        }
    }

}
