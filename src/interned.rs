/// Interned message id (the stable key shared by all locale catalogs).
#[salsa::interned(debug)]
pub struct MessageId {
    #[returns(ref)]
    pub text: String,
}
