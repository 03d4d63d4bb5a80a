use crate::Applets;

use std::ffi::OsStr;

/// Process wide knobs deciding whether built-in applets stand in
/// for external programs.
///
/// The default is all off: every launch goes to the OS.
#[ derive( Debug, Clone, Copy, PartialEq, Eq, Default ) ]
pub struct Policy {
    /// Consult the applet table before exec'ing anything.
    pub prefer_applets: bool,
    /// Run every applet in-process, even those which would
    /// normally get a fresh process image.
    pub force_noexec: bool,
    /// Never fall back to a real program. A name without applet
    /// fails as if it didn't exist.
    pub force_applets: bool,
}

/// Where a launch request ends up.
#[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
pub enum Route<H> {
    /// Run the applet inside this process, then exit with its code.
    InProcess( H ),
    /// Exec our own binary, the applet runs after the image is replaced.
    ReexecSelf,
    /// Refused by [`Policy::force_applets`].
    Denied,
    /// Hand the name to the OS.
    External,
}

impl Policy {
    /// Pick the route for `name`.
    #[ tracing::instrument( level = "debug", skip( applets ) ) ]
    pub fn route<A>( &self, applets: &A, name: &OsStr ) -> Route<A::Handle>
    where
        A: Applets + ?Sized,
    {
        if !self.prefer_applets {
            return Route::External
        }
        match applets.find( name ) {
            Some( handle ) =>
                if self.force_noexec || applets.is_noexec( handle ) {
                    Route::InProcess( handle )
                } else {
                    Route::ReexecSelf
                },
            None if self.force_applets => Route::Denied,
            None => Route::External,
        }
    }
}

#[ cfg( test ) ]
mod test {
    use super::*;
    use crate::test_double::Table;

    use assert2::check;

    const PREFER: Policy = Policy {
        prefer_applets: true,
        force_noexec: false,
        force_applets: false,
    };

    #[ test ]
    fn applets_ignored_unless_preferred() {
        let table = Table::default();
        let policy = Policy { force_applets: true, ..Policy::default() };
        check!( policy.route( &table, "true".as_ref() ) == Route::External );
        check!( policy.route( &table, "nope".as_ref() ) == Route::External );
    }

    #[ test ]
    fn noexec_applet_runs_in_process() {
        let table = Table::default();
        check!( PREFER.route( &table, "true".as_ref() )
            == Route::InProcess( 0 ) );
    }

    #[ test ]
    fn regular_applet_reexecs() {
        let table = Table::default();
        check!( PREFER.route( &table, "which".as_ref() ) == Route::ReexecSelf );

        let forced = Policy { force_noexec: true, ..PREFER };
        check!( forced.route( &table, "which".as_ref() )
            == Route::InProcess( 1 ) );
    }

    #[ test ]
    fn unknown_name() {
        let table = Table::default();
        check!( PREFER.route( &table, "ls".as_ref() ) == Route::External );

        let only = Policy { force_applets: true, ..PREFER };
        check!( only.route( &table, "ls".as_ref() ) == Route::Denied );
        check!( only.route( &table, "true".as_ref() )
            == Route::InProcess( 0 ) );
    }
}
