// Two security tiers: public token acquisition, then everything else
// behind the access guard.
pub mod protected;
pub mod public;
