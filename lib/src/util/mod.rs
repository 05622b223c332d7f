pub mod crc;
pub mod file;
pub mod read;

#[cfg(test)]
pub(crate) mod test_util;
