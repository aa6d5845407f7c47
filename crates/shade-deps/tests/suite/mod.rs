mod minimize;
