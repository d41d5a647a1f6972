/// Publication integration tests
mod publication {
    mod archive;
    mod epub;
    mod util;
    mod webpub;
}
