use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct EnqueueEmailRequestDto {
    pub recipient: String,
}
